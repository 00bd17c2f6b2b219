//! Unit tests for the per-channel sample queues

use crate::common::{create_initialized_driver, run_cycles};
use lsm303d::{AccelSample, Channel, DEFAULT_QUEUE_DEPTH, Error, MAX_QUEUE_DEPTH, PollRate};

#[test]
fn test_default_depth() {
    let (driver, _mocks) = create_initialized_driver();

    assert_eq!(driver.queue_depth(Channel::Accel), DEFAULT_QUEUE_DEPTH);
    assert_eq!(driver.queue_depth(Channel::Mag), DEFAULT_QUEUE_DEPTH);
}

#[test]
fn test_depth_limits() {
    let (mut driver, _mocks) = create_initialized_driver();

    assert_eq!(
        driver.set_queue_depth(Channel::Accel, 0),
        Err(Error::InvalidConfig)
    );
    assert_eq!(
        driver.set_queue_depth(Channel::Mag, MAX_QUEUE_DEPTH + 1),
        Err(Error::InvalidConfig)
    );
    assert_eq!(driver.queue_depth(Channel::Accel), DEFAULT_QUEUE_DEPTH);

    driver.set_queue_depth(Channel::Accel, 1).unwrap();
    driver
        .set_queue_depth(Channel::Mag, MAX_QUEUE_DEPTH)
        .unwrap();
    assert_eq!(driver.queue_depth(Channel::Accel), 1);
    assert_eq!(driver.queue_depth(Channel::Mag), MAX_QUEUE_DEPTH);
}

#[test]
fn test_overflow_keeps_newest() {
    let (mut driver, mocks) = create_initialized_driver();
    driver.set_queue_depth(Channel::Accel, 3).unwrap();
    mocks
        .interface
        .set_accel_sequence((1..=5).map(|i| [i, 0, 0]).collect());
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();

    run_cycles(&mut driver, &mocks, Channel::Accel, 5);

    let mut samples = [AccelSample::default(); 8];
    assert_eq!(driver.read_accel(&mut samples), Ok(3));
    let raw: Vec<i16> = samples[..3].iter().map(|s| s.x_raw).collect();
    assert_eq!(raw, vec![3, 4, 5]);
}

#[test]
fn test_partial_drain() {
    let (mut driver, mocks) = create_initialized_driver();
    driver.set_queue_depth(Channel::Accel, 10).unwrap();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();

    run_cycles(&mut driver, &mocks, Channel::Accel, 6);

    let mut samples = [AccelSample::default(); 4];
    assert_eq!(driver.read_accel(&mut samples), Ok(4));
    assert_eq!(driver.read_accel(&mut samples), Ok(2));
    assert_eq!(driver.read_accel(&mut samples), Err(Error::WouldBlock));
}

#[test]
fn test_shrink_keeps_newest() {
    let (mut driver, mocks) = create_initialized_driver();
    driver.set_queue_depth(Channel::Accel, 10).unwrap();
    mocks
        .interface
        .set_accel_sequence((1..=6).map(|i| [0, i, 0]).collect());
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    run_cycles(&mut driver, &mocks, Channel::Accel, 6);

    driver.set_queue_depth(Channel::Accel, 2).unwrap();

    assert_eq!(driver.accel_queue().len(), 2);
    assert_eq!(driver.accel_queue().pop().map(|s| s.y_raw), Some(5));
    assert_eq!(driver.accel_queue().pop().map(|s| s.y_raw), Some(6));
}
