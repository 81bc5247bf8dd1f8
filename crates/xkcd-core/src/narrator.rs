//! Maps the two speaker labels of a dialog onto the two characters of the
//! display.

use crate::dialog::{DialogError, SpokenLine};

/// Canonical speakers the pointer knows about.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Narrator {
    Cueball,
    Megan,
}

impl Narrator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cueball => "cueball",
            Self::Megan => "megan",
        }
    }
}

const CUEBALL_MARKER: &str = "cueball";

/// Replaces speaker labels with `cueball` and `megan`.
///
/// Labels are compared case-insensitively and there must be exactly two of
/// them. When only the second label mentions cueball it becomes cueball,
/// otherwise the first label does.
pub fn normalize(lines: &[SpokenLine]) -> Result<Vec<SpokenLine>, DialogError> {
    let mut labels: Vec<String> = Vec::with_capacity(2);
    for line in lines {
        let label = line.speaker.to_lowercase();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let [first, second] = labels.as_slice() else {
        return Err(DialogError::SpeakerCount {
            found: labels.len(),
        });
    };

    let second_is_cueball =
        second.contains(CUEBALL_MARKER) && !first.contains(CUEBALL_MARKER);
    let (first_as, second_as) = if second_is_cueball {
        (Narrator::Megan, Narrator::Cueball)
    } else {
        (Narrator::Cueball, Narrator::Megan)
    };

    Ok(lines
        .iter()
        .map(|line| {
            let narrator = if line.speaker.to_lowercase() == *first {
                first_as
            } else {
                second_as
            };
            SpokenLine::new(narrator.as_str(), line.text.clone())
        })
        .collect())
}
