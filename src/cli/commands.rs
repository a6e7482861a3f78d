//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ProcessorConfig;
use crate::engine::{export_audio, import_audio, rms_level, BusLayout};
use crate::error::{FxError, Result};
use crate::order::{DspOption, DspOrder};
use crate::params::ParameterSet;
use crate::processor::{Controller, Levels, PersistedState, Processor};

/// Everything the `process` command needs
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub order: Option<String>,
    pub state: Option<PathBuf>,
    pub set: Vec<String>,
    pub bypass: Vec<String>,
    pub block_size: usize,
    pub config: Option<PathBuf>,
    pub bit_depth: u16,
}

/// Split a "name=value" override
pub fn parse_assignment(assignment: &str) -> Result<(String, f64)> {
    let invalid = || FxError::InvalidParameter {
        param: assignment.to_string(),
        value: String::new(),
        expected: "NAME=VALUE".to_string(),
    };

    let (name, value) = assignment.rsplit_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| FxError::InvalidParameter {
            param: name.to_string(),
            value: value.trim().to_string(),
            expected: "a number".to_string(),
        })?;

    Ok((name.to_string(), value))
}

/// Apply state file, overrides, bypasses and order to a controller
fn configure(controller: &mut Controller, options: &ProcessOptions) -> Result<()> {
    if let Some(path) = &options.state {
        if !path.exists() {
            return Err(FxError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        controller.set_state(&fs::read(path)?)?;
    }

    for assignment in &options.set {
        let (name, value) = parse_assignment(assignment)?;
        controller.params().set_by_name(&name, value)?;
        debug!(param = %name, value, "Set parameter");
    }

    for name in &options.bypass {
        let option: DspOption = name.parse()?;
        controller.params().set_bypassed(option, true);
        debug!(option = %option, "Bypassed module");
    }

    if let Some(order) = &options.order {
        controller.push_reorder_request(order.parse()?)?;
    }

    Ok(())
}

/// Render `options.input` through the chain into `options.output`
///
/// Returns whole-file RMS levels before and after the chain.
pub fn process_file(options: &ProcessOptions) -> Result<Levels> {
    let config = match &options.config {
        Some(path) => ProcessorConfig::from_file(path)?,
        None => ProcessorConfig::default(),
    };

    if options.block_size == 0 {
        return Err(FxError::InvalidConfig {
            reason: "block size must be at least 1".to_string(),
        });
    }

    Processor::check_layout(&BusLayout::stereo())?;

    info!("Processing {}", options.input.display());
    let mut buffer = import_audio(&options.input)?;
    if !buffer.is_finite() {
        return Err(FxError::InvalidAudio {
            reason: "input contains NaN or infinite samples".to_string(),
        });
    }

    let (mut processor, mut controller) = Processor::new(config)?;
    configure(&mut controller, options)?;
    processor.prepare(buffer.sample_rate as f64, options.block_size)?;

    let (left, right) = buffer.stereo_mut().ok_or_else(|| FxError::InvalidAudio {
        reason: "expected a stereo buffer".to_string(),
    })?;

    let pre = (rms_level(left), rms_level(right));
    for (l, r) in left
        .chunks_mut(options.block_size)
        .zip(right.chunks_mut(options.block_size))
    {
        processor.process_stereo(l, r);
    }
    let post = (rms_level(left), rms_level(right));

    info!(
        order = %processor.active_order(),
        "Rendered {} samples ({:.2} s)",
        buffer.len(),
        buffer.duration_secs()
    );
    export_audio(&buffer, &options.output, options.bit_depth)?;

    Ok(Levels {
        pre_left: pre.0,
        pre_right: pre.1,
        post_left: post.0,
        post_right: post.1,
    })
}

/// `process` command
pub fn process(options: &ProcessOptions) -> Result<()> {
    let levels = process_file(options)?;
    let db = levels.to_db();

    println!("Wrote {}", options.output.display());
    println!(
        "Input  RMS: L {:>7.2} dB | R {:>7.2} dB",
        db.pre_left, db.pre_right
    );
    println!(
        "Output RMS: L {:>7.2} dB | R {:>7.2} dB",
        db.post_left, db.post_right
    );
    Ok(())
}

/// Serialised state of a fresh processor
pub fn default_state_bytes() -> Result<Vec<u8>> {
    let params = ParameterSet::new();
    PersistedState::capture(&params, &DspOrder::default()).to_bytes()
}

/// `default-state` command
pub fn write_default_state(path: &Path) -> Result<()> {
    fs::write(path, default_state_bytes()?)?;
    println!("Default state written to {}", path.display());
    Ok(())
}

/// Human-readable rendering of a state file
pub fn describe_state(bytes: &[u8]) -> Result<String> {
    let state = PersistedState::from_bytes(bytes)?;
    let params = ParameterSet::new();
    for (name, value) in &state.params {
        // Unknown names are simply not shown
        let _ = params.set_by_name(name, *value);
    }

    let mut out = String::new();
    out.push_str(&format!("State version {}\n", state.version));

    let order = state.order();
    if order.is_sentinel() {
        out.push_str("Order: (none stored)\n");
    } else {
        out.push_str(&format!("Order: {}\n", order));
    }

    out.push_str(&format!("Selected Tab = {}\n", params.selected_tab()));
    for option in DspOption::ALL {
        out.push_str(&format!("\n[{}]\n", option));
        for param in params.params_for_option(option) {
            out.push_str(&format!("  {}\n", param));
        }
    }

    Ok(out)
}

/// `show-state` command
pub fn show_state(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(FxError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    print!("{}", describe_state(&fs::read(path)?)?);
    Ok(())
}

/// `params` command
pub fn list_params() -> Result<()> {
    let params = ParameterSet::new();
    for option in DspOption::ALL {
        println!("[{}]", option);
        for param in params.params_for_option(option) {
            println!(
                "  {:<28} {:<40} default {}",
                param.name(),
                param.describe_range(),
                param.default_value()
            );
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_stereo_test_tone;
    use tempfile::tempdir;

    fn options(input: PathBuf, output: PathBuf) -> ProcessOptions {
        ProcessOptions {
            input,
            output,
            order: None,
            state: None,
            set: Vec::new(),
            bypass: Vec::new(),
            block_size: 256,
            config: None,
            bit_depth: 32,
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Phaser Mix % = 50").unwrap(),
            ("Phaser Mix %".to_string(), 50.0)
        );
        assert!(parse_assignment("no equals sign").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("Chorus Mix %=lots").is_err());
    }

    #[test]
    fn test_process_file_all_bypassed_is_identity() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");

        let tone = generate_stereo_test_tone(440.0, 660.0, 0.1, 48000);
        export_audio(&tone, &input, 32).unwrap();

        let mut opts = options(input, output.clone());
        opts.bypass = DspOption::ALL.iter().map(|o| o.to_string()).collect();
        let levels = process_file(&opts).unwrap();
        assert_eq!(levels.pre_left, levels.post_left);
        assert_eq!(levels.pre_right, levels.post_right);

        let rendered = import_audio(&output).unwrap();
        assert_eq!(rendered.samples, tone.samples);
    }

    #[test]
    fn test_process_file_with_order_and_overrides() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        export_audio(&generate_stereo_test_tone(220.0, 220.0, 0.1, 48000), &input, 16).unwrap();

        let mut opts = options(input, output.clone());
        opts.order = Some("ladder,overdrive,phaser,chorus,filter".to_string());
        opts.set = vec![
            "Ladder Filter Cutoff Hz=500".to_string(),
            "OverDrive Saturation=40".to_string(),
        ];
        let levels = process_file(&opts).unwrap();
        assert!(levels.post_left.is_finite() && levels.post_left > 0.0);
        assert!(output.exists());
    }

    #[test]
    fn test_process_file_rejects_bad_order() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        export_audio(&generate_stereo_test_tone(220.0, 220.0, 0.05, 48000), &input, 16).unwrap();

        let mut opts = options(input, dir.path().join("out.wav"));
        opts.order = Some("ladder,ladder,phaser,chorus,filter".to_string());
        let err = process_file(&opts).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ORDER");
    }

    #[test]
    fn test_process_file_rejects_tiny_sample_rate() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("slow.wav");
        export_audio(&generate_stereo_test_tone(2.0, 2.0, 1.0, 16), &input, 16).unwrap();

        let err = process_file(&options(input, dir.path().join("out.wav"))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(!dir.path().join("out.wav").exists());
    }

    #[test]
    fn test_process_file_rejects_non_finite_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("nan.wav");
        let mut tone = generate_stereo_test_tone(220.0, 220.0, 0.05, 48000);
        tone.samples[0][10] = f32::NAN;
        export_audio(&tone, &input, 32).unwrap();

        let err = process_file(&options(input, dir.path().join("out.wav"))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_default_state_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_default_state(&path).unwrap();

        let text = describe_state(&fs::read(&path).unwrap()).unwrap();
        assert!(text.contains("Order: Phase,Chorus,OverDrive,LadderFilter,GeneralFilter"));
        assert!(text.contains("Ladder Filter Mode = LPF12"));
        assert!(text.contains("[GeneralFilter]"));
    }

    #[test]
    fn test_show_state_missing_file() {
        let err = show_state(Path::new("/nonexistent/state.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
