use core::{cell::RefCell, convert::Infallible};
use std::rc::Rc;

use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin},
    pwm::{self, SetDutyCycle},
    spi::{self, Operation, SpiDevice},
};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Command(u8),
    Data(Vec<u8>),
    Reset(bool),
    Duty(u16),
    Delay(u32),
}

#[derive(Default)]
struct Bench {
    events: Vec<Event>,
    dc_high: bool,
    busy_reads_left: u32,
}

type Shared = Rc<RefCell<Bench>>;

struct FakeSpi(Shared);
struct FakeDc(Shared);
struct FakeRst(Shared);
struct FakeBusy(Shared);
struct FakeServo(Shared);
struct FakeDelay(Shared);

impl spi::ErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice<u8> for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut bench = self.0.borrow_mut();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                let event = if bench.dc_high {
                    Event::Data(bytes.to_vec())
                } else {
                    assert_eq!(bytes.len(), 1, "commands are single bytes");
                    Event::Command(bytes[0])
                };
                bench.events.push(event);
            }
        }
        Ok(())
    }
}

impl digital::ErrorType for FakeDc {
    type Error = Infallible;
}

impl OutputPin for FakeDc {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().dc_high = true;
        Ok(())
    }
}

impl digital::ErrorType for FakeRst {
    type Error = Infallible;
}

impl OutputPin for FakeRst {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Reset(true));
        Ok(())
    }
}

impl digital::ErrorType for FakeBusy {
    type Error = Infallible;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_low()?)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        let mut bench = self.0.borrow_mut();
        if bench.busy_reads_left == 0 {
            return Ok(false);
        }
        bench.busy_reads_left -= 1;
        Ok(true)
    }
}

impl pwm::ErrorType for FakeServo {
    type Error = Infallible;
}

impl SetDutyCycle for FakeServo {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Duty(duty));
        Ok(())
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().events.push(Event::Delay(ns / 1_000_000));
    }
}

type TestEpd = Epd4in2<FakeSpi, FakeDc, FakeRst, FakeBusy, FakeServo>;

fn bench(config: Config) -> (TestEpd, FakeDelay, Shared) {
    let shared: Shared = Rc::new(RefCell::new(Bench::default()));
    let epd = Epd4in2::new(
        FakeSpi(shared.clone()),
        FakeDc(shared.clone()),
        FakeRst(shared.clone()),
        FakeBusy(shared.clone()),
        FakeServo(shared.clone()),
        config,
    );
    (epd, FakeDelay(shared.clone()), shared)
}

fn take_events(shared: &Shared) -> Vec<Event> {
    core::mem::take(&mut shared.borrow_mut().events)
}

fn data_after(events: &[Event], command: u8) -> Vec<u8> {
    let start = events
        .iter()
        .position(|e| *e == Event::Command(command))
        .expect("command was sent");
    events[start + 1..]
        .iter()
        .take_while(|e| matches!(e, Event::Data(_)))
        .flat_map(|e| match e {
            Event::Data(bytes) => bytes.clone(),
            _ => Vec::new(),
        })
        .collect()
}

fn frame_with_black_corner() -> FrameBuffer {
    let mut frame = FrameBuffer::new();
    frame.set_pixel(0, 0, true);
    frame
}

#[test]
fn init_resets_loads_slow_tables_and_primes_white_reference() {
    let (mut epd, mut delay, shared) = bench(Config::default());

    epd.init(&mut delay).unwrap();

    let events = take_events(&shared);
    let resets: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::Reset(_)))
        .collect();
    assert_eq!(
        resets,
        vec![&Event::Reset(true), &Event::Reset(false), &Event::Reset(true)]
    );
    assert_eq!(
        data_after(&events, protocol::BOOSTER_SOFT_START),
        vec![0x17, 0x17, 0x17]
    );
    assert_eq!(data_after(&events, protocol::PANEL_SETTING), vec![0x3F]);
    assert_eq!(epd.refresh_mode(), Some(RefreshMode::Slow));

    let primed = data_after(&events, protocol::DATA_START_TRANSMISSION_1);
    assert_eq!(primed.len(), protocol::BUFFER_SIZE);
    assert!(primed.iter().all(|b| *b == 0xFF));
}

#[test]
fn show_and_move_follows_refresh_sequence() {
    let (mut epd, mut delay, shared) = bench(Config::default());
    epd.init(&mut delay).unwrap();
    take_events(&shared);
    shared.borrow_mut().busy_reads_left = 2;

    let frame = frame_with_black_corner();
    epd.show_and_move(&frame, RefreshMode::Slow, 9, &mut delay)
        .unwrap();

    let events = take_events(&shared);
    let order: Vec<&Event> = events
        .iter()
        .filter(|e| !matches!(e, Event::Data(_)))
        .collect();
    assert_eq!(
        order,
        vec![
            &Event::Command(protocol::DATA_START_TRANSMISSION_1),
            &Event::Command(protocol::DATA_START_TRANSMISSION_2),
            &Event::Command(protocol::DISPLAY_REFRESH),
            &Event::Duty(9),
            &Event::Delay(250),
            &Event::Duty(0),
            &Event::Delay(100),
            &Event::Delay(100),
        ]
    );
    assert_eq!(
        data_after(&events, protocol::DATA_START_TRANSMISSION_2),
        frame.bytes().to_vec()
    );
    assert_eq!(epd.previous_frame(), &frame);
}

#[test]
fn previous_frame_is_sent_on_first_channel() {
    let (mut epd, mut delay, shared) = bench(Config::default());
    epd.init(&mut delay).unwrap();

    let first = frame_with_black_corner();
    epd.show_and_move(&first, RefreshMode::Slow, 5, &mut delay)
        .unwrap();
    take_events(&shared);

    let second = FrameBuffer::new();
    epd.show_and_move(&second, RefreshMode::Quick, 7, &mut delay)
        .unwrap();

    let events = take_events(&shared);
    assert_eq!(
        data_after(&events, protocol::DATA_START_TRANSMISSION_1),
        first.bytes().to_vec()
    );
    assert_eq!(
        data_after(&events, protocol::DATA_START_TRANSMISSION_2),
        second.bytes().to_vec()
    );
    assert!(events.contains(&Event::Command(protocol::VCOM_LUT)));
}

#[test]
fn quick_tables_are_uploaded_once_for_consecutive_quick_panels() {
    let (mut epd, mut delay, shared) = bench(Config::default());
    epd.init(&mut delay).unwrap();
    take_events(&shared);

    let frame = FrameBuffer::new();
    epd.show_and_move(&frame, RefreshMode::Quick, 5, &mut delay)
        .unwrap();
    epd.show_and_move(&frame, RefreshMode::Quick, 9, &mut delay)
        .unwrap();

    let uploads = take_events(&shared)
        .iter()
        .filter(|e| **e == Event::Command(protocol::VCOM_LUT))
        .count();
    assert_eq!(uploads, 1);
}

#[test]
fn data_bursts_are_chunked() {
    let config = Config {
        max_transfer: 4_096,
        ..Config::default()
    };
    let (mut epd, mut delay, shared) = bench(config);
    epd.init(&mut delay).unwrap();
    take_events(&shared);

    epd.transmit_frame(&FrameBuffer::new()).unwrap();

    let sizes: Vec<usize> = take_events(&shared)
        .iter()
        .filter_map(|e| match e {
            Event::Data(bytes) => Some(bytes.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![4_096, 4_096, 4_096, 2_712, 4_096, 4_096, 4_096, 2_712]);
}

#[test]
fn stuck_busy_line_times_out() {
    let config = Config {
        busy_timeout_ms: 300,
        ..Config::default()
    };
    let (mut epd, mut delay, shared) = bench(config);
    shared.borrow_mut().busy_reads_left = u32::MAX;

    let err = epd.wait_until_idle(&mut delay).unwrap_err();
    assert_eq!(err, Error::BusyTimeout { waited_ms: 300 });
}

#[test]
fn pointer_target_above_full_duty_is_rejected() {
    let (mut epd, mut delay, _shared) = bench(Config::default());
    assert_eq!(
        epd.move_pointer(101, &mut delay),
        Err(Error::InvalidInput)
    );
}

#[test]
fn sleep_powers_off_then_enters_deep_sleep() {
    let (mut epd, mut delay, shared) = bench(Config::default());

    epd.sleep(&mut delay).unwrap();

    let events = take_events(&shared);
    assert_eq!(
        events,
        vec![
            Event::Command(protocol::POWER_OFF),
            Event::Command(protocol::DEEP_SLEEP),
            Event::Data(vec![protocol::DEEP_SLEEP_CHECK]),
            Event::Duty(0),
        ]
    );
}

#[test]
fn clear_reloads_slow_tables_and_blanks_both_channels() {
    let (mut epd, mut delay, shared) = bench(Config::default());
    epd.init(&mut delay).unwrap();
    epd.show_and_move(&frame_with_black_corner(), RefreshMode::Quick, 5, &mut delay)
        .unwrap();
    take_events(&shared);
    shared.borrow_mut().busy_reads_left = 1;

    epd.clear(&mut delay).unwrap();

    let events = take_events(&shared);
    let commands: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            Event::Command(command) => Some(*command),
            _ => None,
        })
        .collect();
    let mut expected: Vec<u8> = lut::lut_chain(RefreshMode::Slow)
        .iter()
        .map(|(command, _)| *command)
        .collect();
    expected.extend([
        protocol::DATA_START_TRANSMISSION_1,
        protocol::DATA_START_TRANSMISSION_2,
        protocol::DISPLAY_REFRESH,
    ]);
    assert_eq!(commands, expected);

    for channel in [
        protocol::DATA_START_TRANSMISSION_1,
        protocol::DATA_START_TRANSMISSION_2,
    ] {
        let sent = data_after(&events, channel);
        assert_eq!(sent.len(), protocol::BUFFER_SIZE);
        assert!(sent.iter().all(|b| *b == WHITE));
    }
    assert_eq!(events.last(), Some(&Event::Delay(100)));
    assert_eq!(epd.refresh_mode(), Some(RefreshMode::Slow));
    assert_eq!(epd.previous_frame(), &FrameBuffer::new());
}
