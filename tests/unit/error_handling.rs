//! Unit tests for error propagation and recovery

use crate::common::{
    MockDrdy, MockError, MockInterface, MockTimer, RecordingSink, create_initialized_driver,
    create_mock_driver,
};
use lsm303d::{AccelSample, Channel, Error, Lsm303d, MagSample, Measurement, PollRate};

#[test]
fn test_invalid_who_am_i() {
    let interface = MockInterface::new();
    interface.set_who_am_i(0x33);

    let result = Lsm303d::new(
        interface,
        MockDrdy::new(),
        MockTimer::new(),
        RecordingSink::default(),
    );
    assert!(matches!(result, Err(Error::InvalidDevice(0x33))));
}

#[test]
fn test_identity_check_bus_failure() {
    let interface = MockInterface::new();
    interface.fail_next_read();

    let result = Lsm303d::new(
        interface,
        MockDrdy::new(),
        MockTimer::new(),
        RecordingSink::default(),
    );
    assert!(matches!(result, Err(Error::Bus(MockError::Communication))));
}

#[test]
fn test_read_failure_during_measurement() {
    let (mut driver, mocks) = create_initialized_driver();
    let reads = driver.stats().accel_reads;

    mocks.interface.fail_next_read();
    assert_eq!(
        driver.measure_accel(),
        Err(Error::Bus(MockError::Communication))
    );
    assert_eq!(driver.stats().accel_reads, reads);

    // Next cycle works again
    assert_eq!(driver.measure_accel(), Ok(Measurement::Sampled));
}

#[test]
fn test_write_failure_during_reset() {
    let (mut driver, mocks) = create_mock_driver();

    mocks.interface.fail_next_write();
    assert_eq!(driver.reset(), Err(Error::Bus(MockError::Communication)));

    driver.reset().unwrap();
    assert_eq!(mocks.interface.get_register(0x20), 0x9F);
}

#[test]
fn test_write_failure_during_configuration() {
    let (mut driver, mocks) = create_initialized_driver();

    mocks.interface.fail_next_write();
    assert_eq!(
        driver.set_mag_sample_rate(50),
        Err(Error::Bus(MockError::Communication))
    );

    driver.set_mag_sample_rate(50).unwrap();
    assert_eq!(mocks.interface.get_register(0x24) & 0x1C, 0x10);
}

#[test]
fn test_empty_buffer_rejected() {
    let (mut driver, _mocks) = create_initialized_driver();

    let mut accel: [AccelSample; 0] = [];
    let mut mag: [MagSample; 0] = [];
    assert_eq!(driver.read_accel(&mut accel), Err(Error::BufferTooSmall));
    assert_eq!(driver.read_mag(&mut mag), Err(Error::BufferTooSmall));
}

#[test]
fn test_would_block_when_polling() {
    let (mut driver, _mocks) = create_initialized_driver();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();

    let mut samples = [AccelSample::default(); 4];
    assert_eq!(driver.read_accel(&mut samples), Err(Error::WouldBlock));
}

#[test]
fn test_faulty_drdy_counts_as_not_ready() {
    let (mut driver, mocks) = create_initialized_driver();
    mocks.drdy.set_faulty();

    assert_eq!(driver.measure_accel(), Ok(Measurement::NotReady));
    assert_eq!(driver.stats().accel_reschedules, 1);
}

#[test]
fn test_manual_read_not_ready_returns_zero() {
    let (mut driver, mocks) = create_initialized_driver();
    mocks.drdy.set_ready(false);

    let mut samples = [AccelSample::default(); 2];
    assert_eq!(driver.read_accel(&mut samples), Ok(0));
    // Manual mode never arms a retry
    assert_eq!(mocks.timer.delay_count(Channel::Accel), 0);
}
