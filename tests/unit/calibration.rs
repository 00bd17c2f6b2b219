//! Unit tests for calibration handling

use crate::common::{assert_float_eq, create_initialized_driver};
use lsm303d::{AccelCalibration, AccelRange, Channel, Error, MagCalibration, MagRange};

#[test]
fn test_accel_calibration_applied() {
    let (mut driver, mocks) = create_initialized_driver();
    driver.set_driver_lowpass(Channel::Accel, 0.0).unwrap();

    let calibration = AccelCalibration {
        offset_x: 1.0,
        scale_x: 1.1,
        offset_y: -0.5,
        scale_y: 0.9,
        offset_z: 0.0,
        scale_z: 1.0,
    };
    driver.set_accel_calibration(calibration).unwrap();
    assert_eq!(driver.accel_calibration(), &calibration);

    mocks.interface.set_accel_data(1000, 1000, 1000);
    driver.accel_queue().flush();
    driver.measure_accel().unwrap();
    let sample = driver.accel_queue().pop().unwrap();

    let lsb = AccelRange::G8.scale_m_s2();
    assert_float_eq(sample.x, (1000.0 * lsb - 1.0) * 1.1, 1e-4);
    assert_float_eq(sample.y, (1000.0 * lsb + 0.5) * 0.9, 1e-4);
    assert_float_eq(sample.z, 1000.0 * lsb, 1e-4);
    assert_float_eq(sample.scaling, lsb, 1e-9);
}

#[test]
fn test_implausible_accel_calibration_rejected() {
    let (mut driver, _mocks) = create_initialized_driver();

    let good = AccelCalibration {
        offset_x: 0.2,
        ..Default::default()
    };
    driver.set_accel_calibration(good).unwrap();

    // Scales summing to 4.0 or more are rejected
    let too_large = AccelCalibration {
        scale_x: 2.0,
        scale_y: 1.0,
        scale_z: 1.0,
        ..Default::default()
    };
    assert_eq!(
        driver.set_accel_calibration(too_large),
        Err(Error::InvalidConfig)
    );

    // Scales summing to 2.0 or less are rejected
    let too_small = AccelCalibration {
        scale_x: 0.5,
        scale_y: 0.5,
        scale_z: 1.0,
        ..Default::default()
    };
    assert_eq!(
        driver.set_accel_calibration(too_small),
        Err(Error::InvalidConfig)
    );

    assert_eq!(driver.accel_calibration(), &good);
}

#[test]
fn test_mag_calibration_applied() {
    let (mut driver, mocks) = create_initialized_driver();

    let calibration = MagCalibration {
        offset_x: 0.05,
        scale_x: 2.0,
        ..Default::default()
    };
    driver.set_mag_calibration(calibration);
    assert_eq!(driver.mag_calibration(), &calibration);

    mocks.interface.set_mag_data(1000, -1000, 0);
    let mut samples = [lsm303d::MagSample::default(); 1];
    assert_eq!(driver.read_mag(&mut samples), Ok(1));

    let lsb = MagRange::Ga2.scale_ga();
    assert_float_eq(samples[0].x, (1000.0 * lsb - 0.05) * 2.0, 1e-5);
    assert_float_eq(samples[0].y, -1000.0 * lsb, 1e-5);
    assert_float_eq(samples[0].z, 0.0, 1e-6);
}

#[test]
fn test_reset_keeps_calibration() {
    let (mut driver, _mocks) = create_initialized_driver();

    let accel = AccelCalibration {
        offset_x: 0.1,
        scale_x: 1.05,
        offset_y: 0.2,
        scale_y: 0.95,
        offset_z: 0.3,
        scale_z: 1.02,
    };
    let mag = MagCalibration {
        offset_x: 0.01,
        offset_y: 0.02,
        offset_z: 0.03,
        ..Default::default()
    };
    driver.set_accel_calibration(accel).unwrap();
    driver.set_mag_calibration(mag);

    driver.reset().unwrap();

    assert_eq!(driver.accel_calibration(), &accel);
    assert_eq!(driver.mag_calibration(), &mag);
}
