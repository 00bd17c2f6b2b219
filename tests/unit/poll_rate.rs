//! Unit tests for poll-rate handling

use crate::common::{TimerOp, create_initialized_driver, run_cycles};
use lsm303d::{AccelSample, Channel, Error, Measurement, PollRate};

#[test]
fn test_default_rate_arms_timer() {
    let (mut driver, mocks) = create_initialized_driver();
    mocks.timer.clear_ops();

    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();

    assert_eq!(
        mocks.timer.ops(),
        vec![
            TimerOp::Cancel(Channel::Accel),
            TimerOp::Cancel(Channel::Mag),
            TimerOp::CallEvery {
                channel: Channel::Accel,
                delay_us: 1_000,
                interval_us: 1_250,
            },
        ]
    );
    assert_eq!(driver.poll_rate(Channel::Accel), PollRate::Hz(800));
    assert_eq!(driver.poll_rate(Channel::Mag), PollRate::Manual);
}

#[test]
fn test_max_rates() {
    let (mut driver, mocks) = create_initialized_driver();

    driver.set_poll_rate(Channel::Accel, PollRate::Max).unwrap();
    driver.set_poll_rate(Channel::Mag, PollRate::Max).unwrap();

    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(625));
    assert_eq!(mocks.timer.armed_interval(Channel::Mag), Some(10_000));
}

#[test]
fn test_invalid_rates_rejected() {
    let (mut driver, mocks) = create_initialized_driver();
    mocks.timer.clear_ops();

    assert_eq!(
        driver.set_poll_rate(Channel::Accel, PollRate::Hz(0)),
        Err(Error::InvalidConfig)
    );
    assert_eq!(
        driver.set_poll_rate(Channel::Accel, PollRate::Hz(2001)),
        Err(Error::InvalidConfig)
    );
    assert_eq!(
        driver.set_poll_rate(Channel::Mag, PollRate::Hz(1001)),
        Err(Error::InvalidConfig)
    );

    assert!(mocks.timer.ops().is_empty());
    assert_eq!(driver.poll_rate(Channel::Accel), PollRate::Manual);

    // The fastest accepted rates
    driver
        .set_poll_rate(Channel::Accel, PollRate::Hz(2000))
        .unwrap();
    driver.set_poll_rate(Channel::Mag, PollRate::Hz(1000)).unwrap();
    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(500));
    assert_eq!(mocks.timer.armed_interval(Channel::Mag), Some(1_000));
}

#[test]
fn test_retune_running_channel() {
    let (mut driver, mocks) = create_initialized_driver();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    run_cycles(&mut driver, &mocks, Channel::Accel, 1);
    mocks.timer.clear_ops();

    driver
        .set_poll_rate(Channel::Accel, PollRate::Hz(400))
        .unwrap();

    assert_eq!(
        mocks.timer.ops(),
        vec![TimerOp::SetInterval {
            channel: Channel::Accel,
            interval_us: 2_500,
        }]
    );
    // Retuning keeps queued samples
    assert_eq!(driver.accel_queue().len(), 1);
    // The driver filter follows the poll rate
    assert_eq!(driver.driver_lowpass(Channel::Accel), Ok(30.0));
}

#[test]
fn test_manual_cancels_only_that_channel() {
    let (mut driver, mocks) = create_initialized_driver();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    driver.set_poll_rate(Channel::Mag, PollRate::Default).unwrap();
    mocks.timer.clear_ops();

    driver.set_poll_rate(Channel::Mag, PollRate::Manual).unwrap();

    assert_eq!(mocks.timer.ops(), vec![TimerOp::Cancel(Channel::Mag)]);
    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(1_250));
    assert_eq!(driver.poll_rate(Channel::Mag), PollRate::Manual);
    assert_eq!(driver.on_timer(Channel::Mag), Ok(Measurement::Inactive));
}

#[test]
fn test_starting_flushes_queues() {
    let (mut driver, mocks) = create_initialized_driver();

    // init left one sample behind
    assert_eq!(driver.accel_queue().len(), 1);
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    assert!(driver.accel_queue().is_empty());

    run_cycles(&mut driver, &mocks, Channel::Accel, 2);
    driver.stop();
    driver.start();
    assert!(driver.accel_queue().is_empty());
    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(1_250));
}

#[test]
fn test_inactive_channel_ignores_timer() {
    let (mut driver, mocks) = create_initialized_driver();
    let bursts = mocks.interface.burst_count(0x27);

    assert_eq!(driver.on_accel_timer(), Ok(Measurement::Inactive));
    assert_eq!(driver.on_mag_timer(), Ok(Measurement::Inactive));
    assert_eq!(mocks.interface.burst_count(0x27), bursts);
}

#[test]
fn test_stop_cancels_both() {
    let (mut driver, mocks) = create_initialized_driver();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    driver.set_poll_rate(Channel::Mag, PollRate::Default).unwrap();

    driver.stop();

    assert_eq!(mocks.timer.armed_interval(Channel::Accel), None);
    assert_eq!(mocks.timer.armed_interval(Channel::Mag), None);
    assert_eq!(driver.poll_rate(Channel::Accel), PollRate::Manual);
    assert_eq!(driver.on_timer(Channel::Accel), Ok(Measurement::Inactive));

    // Stopped channels measure on read
    let mut samples = [AccelSample::default(); 1];
    assert_eq!(driver.read_accel(&mut samples), Ok(1));

    // Intervals are kept for the next start
    driver.start();
    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(1_250));
    assert_eq!(mocks.timer.armed_interval(Channel::Mag), Some(10_000));
    assert_eq!(driver.poll_rate(Channel::Accel), PollRate::Hz(800));
}

#[test]
fn test_rate_change_after_stop_rearms_trigger() {
    let (mut driver, mocks) = create_initialized_driver();
    driver
        .set_poll_rate(Channel::Accel, PollRate::Default)
        .unwrap();
    driver.stop();
    mocks.timer.clear_ops();

    driver
        .set_poll_rate(Channel::Accel, PollRate::Hz(400))
        .unwrap();

    assert!(mocks.timer.ops().contains(&TimerOp::CallEvery {
        channel: Channel::Accel,
        delay_us: 1_000,
        interval_us: 2_500,
    }));
    assert_eq!(mocks.timer.armed_interval(Channel::Accel), Some(2_500));
    assert_eq!(driver.poll_rate(Channel::Accel), PollRate::Hz(400));

    let outcomes = run_cycles(&mut driver, &mocks, Channel::Accel, 2);
    assert_eq!(outcomes, vec![Measurement::Sampled; 2]);

    let mut samples = [AccelSample::default(); 4];
    assert_eq!(driver.read_accel(&mut samples), Ok(2));
}
