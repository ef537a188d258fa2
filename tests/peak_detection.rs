//! Integration tests for peak detection.

use peakforge_rs::models::gaussian;
use peakforge_rs::peaks::{detect_peaks, estimate_noise, DetectConfig};
use peakforge_rs::{PeakParameters, Point};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `n` samples on `[0, 100]` of a sum of Gaussians `(x0, height, fwhm)`.
fn spectrum(peaks: &[(f64, f64, f64)], n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let x = 100.0 * i as f64 / (n - 1) as f64;
            let y = peaks.iter().map(|&(x0, h, w)| gaussian(x, h, x0, w)).sum();
            Point::new(x, y)
        })
        .collect()
}

#[test]
fn test_single_peak() {
    init_logger();
    let peaks = detect_peaks(&spectrum(&[(50.0, 10.0, 5.0)], 500), &DetectConfig::default());

    assert_eq!(peaks.len(), 1);
    let peak = &peaks[0];
    assert!((peak.x - 50.0).abs() < 1.0);
    assert!((peak.y - 10.0).abs() < 0.1);
    assert!((peak.estimated_fwhm - 5.0).abs() < 1.5, "fwhm {}", peak.estimated_fwhm);
}

#[test]
fn test_three_peaks_sorted() {
    init_logger();
    let truth = [(80.0, 8.0, 5.0), (20.0, 5.0, 3.0), (50.0, 12.0, 4.0)];
    let peaks = detect_peaks(&spectrum(&truth, 500), &DetectConfig::default());

    assert_eq!(peaks.len(), 3);
    for (peak, expected) in peaks.iter().zip([20.0, 50.0, 80.0]) {
        assert!((peak.x - expected).abs() < 1.0, "peak at {}", peak.x);
    }
    assert!(peaks.windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn test_prominence_filters_shoulder_bumps() {
    // A bump at 4% of the main peak is below the 5% prominence floor
    let points = spectrum(&[(30.0, 10.0, 4.0), (70.0, 0.4, 4.0)], 500);
    let peaks = detect_peaks(&points, &DetectConfig::default());
    assert_eq!(peaks.len(), 1);

    let relaxed = DetectConfig::default().with_min_prominence_fraction(0.01);
    assert_eq!(detect_peaks(&points, &relaxed).len(), 2);
}

#[test]
fn test_edge_peaks() {
    init_logger();
    let points = spectrum(&[(0.0, 10.0, 6.0), (100.0, 7.0, 6.0)], 400);

    let peaks = detect_peaks(&points, &DetectConfig::default());
    let first = peaks.first().unwrap();
    let last = peaks.last().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(last.index, 399);
    assert!(first.estimated_fwhm > 0.0);
    assert!(last.estimated_fwhm > 0.0);

    let interior_only = detect_peaks(&points, &DetectConfig::default().with_detect_edges(false));
    assert!(interior_only.iter().all(|p| p.index != 0 && p.index != 399));
}

#[test]
fn test_noisy_spectrum() {
    init_logger();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.2).unwrap();

    let points: Vec<Point> = spectrum(&[(20.0, 10.0, 3.0), (60.0, 8.0, 4.0)], 500)
        .into_iter()
        .map(|p| Point::new(p.x, p.y + noise.sample(&mut rng)))
        .collect();

    let sigma = estimate_noise(&points);
    assert!(sigma > 0.1 && sigma < 0.5, "noise estimate {}", sigma);

    let config = DetectConfig::default().with_noise_multiplier(5.0);
    let peaks = detect_peaks(&points, &config);

    assert!(peaks.len() < 10, "{} peaks detected", peaks.len());
    assert!(peaks.iter().any(|p| (p.x - 20.0).abs() < 1.0));
    assert!(peaks.iter().any(|p| (p.x - 60.0).abs() < 1.0));
}

#[test]
fn test_flat_and_short_inputs() {
    let flat: Vec<Point> = (0..100).map(|i| Point::new(i as f64, 5.0)).collect();
    assert!(estimate_noise(&flat) < 0.01);
    assert!(detect_peaks(&flat, &DetectConfig::default()).is_empty());

    let two = [Point::new(0.0, 1.0), Point::new(1.0, 0.0)];
    assert!(detect_peaks(&two, &DetectConfig::default()).is_empty());
    assert_eq!(estimate_noise(&[]), 0.0);
}

#[test]
fn test_detected_peaks_seed_fit_parameters() {
    let peaks = detect_peaks(&spectrum(&[(40.0, 6.0, 5.0)], 300), &DetectConfig::default());
    let seeds: Vec<PeakParameters> = peaks.iter().map(PeakParameters::from).collect();

    assert_eq!(seeds.len(), 1);
    assert_eq!(seeds[0].x0, peaks[0].x);
    assert_eq!(seeds[0].height, peaks[0].y);
    assert_eq!(seeds[0].fwhm, peaks[0].estimated_fwhm);
    assert_eq!(seeds[0].eta, 0.5);
}

#[test]
fn test_detection_is_deterministic() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.3).unwrap();
    let points: Vec<Point> = spectrum(&[(25.0, 9.0, 4.0), (70.0, 6.0, 6.0)], 500)
        .into_iter()
        .map(|p| Point::new(p.x, p.y + noise.sample(&mut rng)))
        .collect();
    let before = points.clone();

    for config in [DetectConfig::default(), DetectConfig::default().with_detect_edges(false)] {
        let first = detect_peaks(&points, &config);
        let second = detect_peaks(&points, &config);
        assert_eq!(first, second);
    }
    assert_eq!(estimate_noise(&points), estimate_noise(&points));
    assert_eq!(points, before);
}
