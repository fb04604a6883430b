use mandelzoom_compute::{
    compute_escape_grid, ColorMapper, ComplexViewport, CpuBackend, DdComplex, F32Complex,
    RenderBackend, DEFAULT_BAILOUT_RADIUS_SQ,
};

fn seahorse_valley() -> ComplexViewport {
    ComplexViewport::from_bounds(-0.76, -0.72, 0.08, 0.12).unwrap()
}

fn render_with_threads(threads: usize, vp: &ComplexViewport) -> Vec<u8> {
    let mut cpu = CpuBackend::new(threads, DEFAULT_BAILOUT_RADIUS_SQ, ColorMapper::default());
    cpu.render(vp, 97, 61, 300).unwrap().pixels
}

#[test]
fn output_is_identical_for_any_worker_count() {
    let vp = seahorse_valley();
    let single = render_with_threads(1, &vp);
    let dual = render_with_threads(2, &vp);
    let many = render_with_threads(7, &vp);
    let default = render_with_threads(0, &vp);

    assert!(single == dual, "1 vs 2 workers differ");
    assert!(single == many, "1 vs 7 workers differ");
    assert!(single == default, "1 vs default pool differ");
}

#[test]
fn repeated_renders_are_deterministic() {
    let vp = ComplexViewport::home();
    let mut cpu = CpuBackend::new(4, DEFAULT_BAILOUT_RADIUS_SQ, ColorMapper::default());
    let a = cpu.render(&vp, 64, 64, 128).unwrap();
    let b = cpu.render(&vp, 64, 64, 128).unwrap();
    assert!(a.pixels == b.pixels);
}

#[test]
fn double_double_and_f32_classify_home_view_alike() {
    let vp = ComplexViewport::home();
    let (w, h, iters) = (120, 120, 256);

    let dd = compute_escape_grid::<DdComplex>(&vp, w, h, iters, DEFAULT_BAILOUT_RADIUS_SQ).unwrap();
    let f32 = compute_escape_grid::<F32Complex>(&vp, w, h, iters, DEFAULT_BAILOUT_RADIUS_SQ).unwrap();

    let agree = dd.iter().zip(&f32).filter(|(a, b)| a.escaped == b.escaped).count();
    let ratio = agree as f64 / dd.len() as f64;
    assert!(ratio >= 0.99, "classification agreement {ratio:.4}");

    let interior_dd = dd.iter().filter(|r| !r.escaped).count() as f64;
    let interior_f32 = f32.iter().filter(|r| !r.escaped).count() as f64;
    assert!(
        (interior_dd - interior_f32).abs() <= interior_dd * 0.01,
        "interior counts {interior_dd} vs {interior_f32}"
    );
}

#[test]
fn cpu_raster_matches_escape_grid() {
    let vp = seahorse_valley();
    let mapper = ColorMapper::default();
    let grid = compute_escape_grid::<DdComplex>(&vp, 40, 30, 200, DEFAULT_BAILOUT_RADIUS_SQ).unwrap();
    let mut expected = vec![0u8; 40 * 30 * 4];
    mapper.colorize_into(&grid, 200, &mut expected);

    let mut cpu = CpuBackend::new(3, DEFAULT_BAILOUT_RADIUS_SQ, mapper);
    let out = cpu.render(&vp, 40, 30, 200).unwrap();
    assert!(out.pixels == expected);
}
