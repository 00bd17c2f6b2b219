//! Unit tests for the calibration self-tests

use crate::common::{create_initialized_driver, create_mock_driver};
use lsm303d::{AccelCalibration, MagCalibration, MagSample};

fn fitted_accel() -> AccelCalibration {
    AccelCalibration {
        offset_x: 0.12,
        scale_x: 1.1,
        offset_y: -0.08,
        scale_y: 0.9,
        offset_z: 0.3,
        scale_z: 1.05,
    }
}

#[test]
fn test_accel_fails_without_samples() {
    let (mut driver, _mocks) = create_mock_driver();
    driver.reset().unwrap();
    driver.set_accel_calibration(fitted_accel()).unwrap();

    assert_eq!(driver.accel_self_test(), 1);
}

#[test]
fn test_accel_fails_with_default_calibration() {
    let (driver, _mocks) = create_initialized_driver();

    // init produced a sample, but offsets are zero and scales exactly unity
    assert_eq!(driver.stats().accel_reads, 1);
    assert_eq!(driver.accel_self_test(), 1);
}

#[test]
fn test_accel_passes_with_fitted_calibration() {
    let (mut driver, _mocks) = create_initialized_driver();
    driver.set_accel_calibration(fitted_accel()).unwrap();

    assert_eq!(driver.accel_self_test(), 0);
}

#[test]
fn test_accel_fails_on_large_scale_deviation() {
    let (mut driver, _mocks) = create_initialized_driver();
    let calibration = AccelCalibration {
        scale_x: 1.5,
        scale_y: 0.9,
        scale_z: 1.0,
        ..fitted_accel()
    };
    driver.set_accel_calibration(calibration).unwrap();

    assert_eq!(driver.accel_self_test(), 1);
}

#[test]
fn test_accel_fails_on_unity_scale() {
    let (mut driver, _mocks) = create_initialized_driver();
    let calibration = AccelCalibration {
        scale_y: 1.0,
        ..fitted_accel()
    };
    driver.set_accel_calibration(calibration).unwrap();

    // Offsets are fitted, but an exact 1.0 scale was never calibrated
    assert_eq!(driver.accel_self_test(), 1);
}

#[test]
fn test_accel_fails_on_zero_offset() {
    let (mut driver, _mocks) = create_initialized_driver();
    let calibration = AccelCalibration {
        offset_y: 0.0,
        ..fitted_accel()
    };
    driver.set_accel_calibration(calibration).unwrap();

    assert_eq!(driver.accel_self_test(), 1);
}

#[test]
fn test_mag_self_test() {
    let (mut driver, _mocks) = create_initialized_driver();

    // No magnetometer samples yet
    assert_eq!(driver.mag_self_test(), 1);

    let mut samples = [MagSample::default(); 1];
    driver.read_mag(&mut samples).unwrap();
    assert_eq!(driver.mag_self_test(), 1);

    driver.set_mag_calibration(MagCalibration {
        offset_x: 0.01,
        offset_y: -0.02,
        offset_z: 0.03,
        // Scales are not checked
        scale_x: 3.0,
        ..Default::default()
    });
    assert_eq!(driver.mag_self_test(), 0);
}

#[test]
fn test_reset_clears_read_counters() {
    let (mut driver, _mocks) = create_initialized_driver();
    driver.set_accel_calibration(fitted_accel()).unwrap();
    assert_eq!(driver.accel_self_test(), 0);

    driver.reset().unwrap();

    assert_eq!(driver.stats().accel_reads, 0);
    assert_eq!(driver.accel_self_test(), 1);
}
