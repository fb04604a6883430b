use mandelzoom_core::{ComplexViewport, DdComplex, DoubleDouble, RenderError};
use mandelzoom_gpu::{check_f32_resolution, GpuError, MIN_RELATIVE_STEP};

#[test]
fn home_view_fits_f32() {
    assert!(check_f32_resolution(&ComplexViewport::home(), 1920, 1080).is_ok());
}

#[test]
fn moderate_zoom_still_fits_f32() {
    let vp = ComplexViewport::home().zoom_about_center(1e3).unwrap();
    assert!(check_f32_resolution(&vp, 800, 600).is_ok());
}

#[test]
fn deep_zoom_exceeds_f32() {
    let center = DdComplex::from_f64(-0.743643887037, 0.131825904205);
    let size = DoubleDouble::from_f64(1e-8);
    let vp = ComplexViewport::from_center_size(center, size, size).unwrap();

    let err = check_f32_resolution(&vp, 800, 800).unwrap_err();
    let GpuError::PrecisionExceeded { step, magnitude } = err else {
        panic!("expected PrecisionExceeded, got {err:?}");
    };
    assert!(step / magnitude < MIN_RELATIVE_STEP);
    assert_eq!(magnitude, 1.0);

    let render: RenderError = GpuError::PrecisionExceeded { step, magnitude }.into();
    assert!(render.is_gpu_recoverable());
}

#[test]
fn threshold_scales_with_coordinate_magnitude() {
    // Same step, larger coordinates: f32 runs out of bits sooner
    let near = ComplexViewport::from_bounds(0.0, 1e-4, 0.0, 1e-4).unwrap();
    let far = ComplexViewport::from_bounds(1000.0, 1000.0 + 1e-4, 0.0, 1e-4).unwrap();
    assert!(check_f32_resolution(&near, 100, 100).is_ok());
    assert!(check_f32_resolution(&far, 100, 100).is_err());
}
