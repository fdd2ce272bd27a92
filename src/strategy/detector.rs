// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The iterative threshold/fit/subtract/increase-sensitivity driver that
//! ties the numeric kernels together into one per-baseline detection run.

use crate::algorithms::{dilation, high_pass, sir, sum_threshold};
use crate::structures::{Mask, Polarisation, TimeFrequencyData};
use crate::strategy::{Action, Strategy};

/// Build the per-iteration action sequence (run once per iteration, finest
/// to coarsest sensitivity) and the final-pass sequence (run once, after
/// all iterations).
fn build_iteration_action(strategy: &Strategy, sensitivity: f32) -> Action {
    Action::SumThreshold {
        base_sensitivity: strategy.base_sensitivity * sensitivity * strategy.sum_threshold_sensitivity,
        flag_time: !strategy.keep_transients,
        flag_frequency: true,
    }
}

fn final_pass_actions(strategy: &Strategy) -> Vec<Action> {
    vec![
        Action::SumThreshold {
            base_sensitivity: strategy.base_sensitivity * strategy.sum_threshold_sensitivity,
            flag_time: !strategy.keep_transients,
            flag_frequency: true,
        },
        Action::CombineFlagResults,
        Action::Dilate {
            time_size: strategy.dilation_time_size,
            frequency_size: strategy.dilation_frequency_size,
        },
        Action::Sir {
            eta_time: strategy.sir_eta_time,
            eta_frequency: strategy.sir_eta_freq,
        },
        Action::RowColumnCollapse {
            row_threshold: 1.0 - strategy.min_good_time_ratio,
            column_threshold: 1.0 - strategy.min_good_frequency_ratio,
            global_threshold: 1.0 - strategy.min_available_tf_ratio,
        },
    ]
}

/// Apply the geometric SumThreshold sequence (lengths `1, 2, 4, ..., up to
/// `max_length`, threshold scaled down by `rho` per doubling) to
/// `contaminated`, OR-ing newly flagged samples into `mask`.
fn apply_sum_threshold_sequence(
    contaminated: &crate::structures::Image,
    mask: &mut Mask,
    strategy: &Strategy,
    base_sensitivity: f32,
    flag_time: bool,
    flag_frequency: bool,
) {
    let mut length = 1usize;
    let mut rho_power = 0u32;
    while length <= strategy.max_length && length <= contaminated.width().max(contaminated.height())
    {
        let threshold = base_sensitivity / strategy.rho.powi(rho_power as i32);
        if flag_time && length <= contaminated.width() {
            sum_threshold::horizontal(contaminated, mask, length, threshold);
        }
        if flag_frequency && length <= contaminated.height() {
            sum_threshold::vertical(contaminated, mask, length, threshold);
        }
        length *= 2;
        rho_power += 1;
    }
}

fn row_column_collapse(mask: &mut Mask, row_threshold: f32, column_threshold: f32, global_threshold: f32) {
    let width = mask.width();
    let height = mask.height();
    if width == 0 || height == 0 {
        return;
    }

    if mask.flagged_fraction() > global_threshold {
        mask.flag_all();
        return;
    }

    for y in 0..height {
        let flagged = (0..width).filter(|&x| mask.value(x, y)).count();
        if flagged as f32 / width as f32 > row_threshold {
            mask.set_horizontal_values(0, y, true, width);
        }
    }
    for x in 0..width {
        let flagged = (0..height).filter(|&y| mask.value(x, y)).count();
        if flagged as f32 / height as f32 > column_threshold {
            mask.set_vertical_values(x, 0, true, height);
        }
    }
}

fn run_action(
    action: Action,
    original: &crate::structures::Image,
    mask: &mut Mask,
    contaminated: &mut crate::structures::Image,
    strategy: &Strategy,
    input_mask: Option<&Mask>,
) {
    match action {
        Action::SumThreshold {
            base_sensitivity,
            flag_time,
            flag_frequency,
        } => {
            apply_sum_threshold_sequence(
                contaminated,
                mask,
                strategy,
                base_sensitivity,
                flag_time,
                flag_frequency,
            );
        }
        Action::CombineFlagResults => {
            if strategy.use_original_flags {
                if let Some(input) = input_mask {
                    mask.or_assign(input);
                }
            }
        }
        Action::RecomputeBackground => {
            let background = high_pass::fit_background(
                original,
                mask,
                high_pass::HighPassParams {
                    window_time: strategy.high_pass_window_w,
                    window_frequency: strategy.high_pass_window_h,
                    sigma_sq_time: strategy.high_pass_sigma_sq_h,
                    sigma_sq_frequency: strategy.vertical_smoothing,
                },
            );
            *contaminated = original.sub(&background);
        }
        Action::Sir {
            eta_time,
            eta_frequency,
        } => {
            sir::operate_horizontally(mask, eta_time);
            sir::operate_vertically(mask, eta_frequency);
        }
        Action::Dilate {
            time_size,
            frequency_size,
        } => {
            dilation::dilate(mask, time_size, frequency_size);
        }
        Action::RowColumnCollapse {
            row_threshold,
            column_threshold,
            global_threshold,
        } => {
            row_column_collapse(mask, row_threshold, column_threshold, global_threshold);
        }
    }
}

/// Run the full iterative detector on one amplitude image (and optional
/// input/missing mask), returning the final flag mask.
fn detect_single(
    original: &crate::structures::Image,
    input_mask: Option<&Mask>,
    strategy: &Strategy,
) -> Mask {
    let width = original.width();
    let height = original.height();
    let mut mask = input_mask.cloned().unwrap_or_else(|| Mask::unflagged(width, height));
    let mut contaminated = original.clone();

    let n = strategy.effective_iteration_count();
    let mut sensitivity = strategy.sensitivity_start * 2f32.powf(n as f32 / 2.0);

    for _ in 0..n {
        let action = build_iteration_action(strategy, sensitivity);
        run_action(action, original, &mut mask, &mut contaminated, strategy, input_mask);
        run_action(
            Action::RecomputeBackground,
            original,
            &mut mask,
            &mut contaminated,
            strategy,
            input_mask,
        );
        run_action(
            Action::CombineFlagResults,
            original,
            &mut mask,
            &mut contaminated,
            strategy,
            input_mask,
        );
        sensitivity /= 2.0;
    }

    for action in final_pass_actions(strategy) {
        run_action(action, original, &mut mask, &mut contaminated, strategy, input_mask);
    }

    mask
}

/// Run the detector over a baseline's polarizations, OR-ing the result
/// across them (a sample flagged in any polarization is flagged in all).
/// When `strategy.on_stokes_iq` is set, only Stokes I is used (the fast
/// path); otherwise every polarization present in `data` is run in turn,
/// sharing mask progression across them.
pub fn detect(data: &TimeFrequencyData, strategy: &Strategy) -> Mask {
    let input_mask = data.mask().clone();
    let mut combined = Mask::unflagged(data.width(), data.height());

    let polarisations: Vec<Polarisation> = if strategy.on_stokes_iq {
        vec![Polarisation::I]
    } else {
        [
            Polarisation::I,
            Polarisation::XX,
            Polarisation::XY,
            Polarisation::YX,
            Polarisation::YY,
            Polarisation::RR,
            Polarisation::RL,
            Polarisation::LR,
            Polarisation::LL,
        ]
        .into_iter()
        .filter(|&p| data.amplitude(p).is_some())
        .collect()
    };

    for pol in polarisations {
        if let Some(amplitude) = data.amplitude(pol) {
            let mask = detect_single(&amplitude, Some(&input_mask), strategy);
            combined.or_assign(&mask);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{ComplexImage, Image};

    fn single_polarisation(image: Image) -> TimeFrequencyData {
        let width = image.width();
        let height = image.height();
        let complex = ComplexImage {
            real: image,
            imag: Image::zeros(width, height),
        };
        TimeFrequencyData::new(vec![(Polarisation::I, complex)], Mask::unflagged(width, height))
            .unwrap()
    }

    #[test]
    fn single_bright_sample_is_flagged() {
        let mut data = vec![0.0f32; 100];
        data[55] = 100.0;
        let image = Image::from_vec(10, 10, &data);
        let tf = single_polarisation(image);
        let strategy = Strategy {
            iteration_count: 1,
            ..Strategy::default()
        };
        let mask = detect(&tf, &strategy);
        assert!(mask.value(5, 5));
    }

    #[test]
    fn flat_image_produces_no_flags() {
        let image = Image::from_vec(20, 20, &vec![1.0f32; 400]);
        let tf = single_polarisation(image);
        let mask = detect(&tf, &Strategy::default());
        assert_eq!(mask.count_flagged(), 0);
    }

    #[test]
    fn global_collapse_flags_everything_when_over_threshold() {
        let mut mask = Mask::unflagged(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                if !(x == 0 && y == 0) {
                    mask.set_value(x, y, true);
                }
            }
        }
        row_column_collapse(&mut mask, 2.0, 2.0, 0.5);
        assert_eq!(mask.count_flagged(), 16);
    }
}
