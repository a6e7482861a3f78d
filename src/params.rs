//! Host-facing parameters
//!
//! Every parameter has a stable name, a range and a default. Raw values live in
//! atomics: the control thread writes them (clamped into range) and the audio
//! thread reads them without locking. Continuous parameters are smoothed on
//! the audio side before anything audible uses them.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicUsize, Ordering};

use crate::dsp::{GeneralFilterMode, LadderMode};
use crate::error::{FxError, Result};
use crate::order::DspOption;

// ============================================================================
// Float parameter ids
// ============================================================================

/// Identity of each continuous (smoothed) parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatParamId {
    PhaserRate,
    PhaserCenterFreq,
    PhaserDepth,
    PhaserFeedback,
    PhaserMix,
    ChorusRate,
    ChorusDepth,
    ChorusCenterDelay,
    ChorusFeedback,
    ChorusMix,
    OverdriveSaturation,
    LadderCutoff,
    LadderResonance,
    LadderDrive,
    GeneralFreq,
    GeneralQuality,
    GeneralGain,
}

/// Static description of a float parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatParamSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: &'static str,
}

impl FloatParamId {
    pub const COUNT: usize = 17;

    pub const ALL: [FloatParamId; FloatParamId::COUNT] = [
        FloatParamId::PhaserRate,
        FloatParamId::PhaserCenterFreq,
        FloatParamId::PhaserDepth,
        FloatParamId::PhaserFeedback,
        FloatParamId::PhaserMix,
        FloatParamId::ChorusRate,
        FloatParamId::ChorusDepth,
        FloatParamId::ChorusCenterDelay,
        FloatParamId::ChorusFeedback,
        FloatParamId::ChorusMix,
        FloatParamId::OverdriveSaturation,
        FloatParamId::LadderCutoff,
        FloatParamId::LadderResonance,
        FloatParamId::LadderDrive,
        FloatParamId::GeneralFreq,
        FloatParamId::GeneralQuality,
        FloatParamId::GeneralGain,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The module this parameter belongs to
    pub fn option(self) -> DspOption {
        use FloatParamId::*;
        match self {
            PhaserRate | PhaserCenterFreq | PhaserDepth | PhaserFeedback | PhaserMix => {
                DspOption::Phase
            }
            ChorusRate | ChorusDepth | ChorusCenterDelay | ChorusFeedback | ChorusMix => {
                DspOption::Chorus
            }
            OverdriveSaturation => DspOption::OverDrive,
            LadderCutoff | LadderResonance | LadderDrive => DspOption::LadderFilter,
            GeneralFreq | GeneralQuality | GeneralGain => DspOption::GeneralFilter,
        }
    }

    /// Name, range, default and unit
    pub fn spec(self) -> FloatParamSpec {
        use FloatParamId::*;
        let (name, min, max, default, unit) = match self {
            PhaserRate => ("Phaser RateHz", 0.01, 2.0, 0.2, "Hz"),
            PhaserCenterFreq => ("Phaser Center FreqHz", 20.0, 20000.0, 1000.0, "Hz"),
            PhaserDepth => ("Phaser Depth %", 0.0, 100.0, 5.0, "%"),
            PhaserFeedback => ("Phaser Feedback %", -100.0, 100.0, 0.0, "%"),
            PhaserMix => ("Phaser Mix %", 0.0, 100.0, 5.0, "%"),
            ChorusRate => ("Chorus RateHz", 0.01, 50.0, 0.2, "Hz"),
            ChorusDepth => ("Chorus Depth %", 0.0, 100.0, 5.0, "%"),
            ChorusCenterDelay => ("Chorus Center Delay ms", 1.0, 50.0, 7.0, "ms"),
            ChorusFeedback => ("Chorus Feedback %", -100.0, 100.0, 0.0, "%"),
            ChorusMix => ("Chorus Mix %", 0.0, 100.0, 5.0, "%"),
            OverdriveSaturation => ("OverDrive Saturation", 1.0, 100.0, 1.0, ""),
            LadderCutoff => ("Ladder Filter Cutoff Hz", 20.0, 20000.0, 20000.0, "Hz"),
            LadderResonance => ("Ladder Filter Resonance", 0.0, 100.0, 0.0, "%"),
            LadderDrive => ("Ladder Filter Drive", 1.0, 100.0, 1.0, ""),
            GeneralFreq => ("General Filter Freq hz", 20.0, 20000.0, 750.0, "Hz"),
            GeneralQuality => ("General Filter Quality", 0.01, 100.0, 0.72, ""),
            GeneralGain => ("General Filter Gain", -24.0, 24.0, 0.0, "dB"),
        };
        FloatParamSpec {
            name,
            min,
            max,
            default,
            unit,
        }
    }
}

// ============================================================================
// Parameter cells
// ============================================================================

/// Continuous parameter stored as `f32` bits
#[derive(Debug)]
pub struct FloatParam {
    id: FloatParamId,
    value: AtomicU32,
}

impl FloatParam {
    fn new(id: FloatParamId) -> Self {
        Self {
            id,
            value: AtomicU32::new(id.spec().default.to_bits()),
        }
    }

    pub fn id(&self) -> FloatParamId {
        self.id
    }

    pub fn spec(&self) -> FloatParamSpec {
        self.id.spec()
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Store `value` clamped into range; NaN is ignored
    pub fn set(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        let spec = self.id.spec();
        let clamped = value.clamp(spec.min, spec.max);
        self.value.store(clamped.to_bits(), Ordering::Relaxed);
    }
}

/// On/off parameter (module bypass)
#[derive(Debug)]
pub struct BoolParam {
    name: &'static str,
    option: DspOption,
    value: AtomicBool,
}

impl BoolParam {
    fn new(name: &'static str, option: DspOption) -> Self {
        Self {
            name,
            option,
            value: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Relaxed);
    }
}

/// Pick-one-of parameter (filter modes)
#[derive(Debug)]
pub struct ChoiceParam {
    name: &'static str,
    option: DspOption,
    choices: &'static [&'static str],
    value: AtomicUsize,
}

impl ChoiceParam {
    fn new(name: &'static str, option: DspOption, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            option,
            choices,
            value: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.value.load(Ordering::Relaxed)
    }

    /// Select by index, clamped to the last choice
    pub fn set_index(&self, index: usize) {
        let index = index.min(self.choices.len().saturating_sub(1));
        self.value.store(index, Ordering::Relaxed);
    }

    pub fn choices(&self) -> &'static [&'static str] {
        self.choices
    }

    pub fn selected_name(&self) -> &'static str {
        self.choices.get(self.index()).copied().unwrap_or("")
    }
}

/// Integer parameter (UI tab selection)
#[derive(Debug)]
pub struct IntParam {
    name: &'static str,
    min: i32,
    max: i32,
    default: i32,
    value: AtomicI32,
}

impl IntParam {
    fn new(name: &'static str, min: i32, max: i32, default: i32) -> Self {
        Self {
            name,
            min,
            max,
            default,
            value: AtomicI32::new(default),
        }
    }

    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: i32) {
        self.value.store(value.clamp(self.min, self.max), Ordering::Relaxed);
    }
}

// ============================================================================
// Parameter handles
// ============================================================================

/// Borrowed handle to any parameter, for name-based access
#[derive(Debug, Clone, Copy)]
pub enum ParamRef<'a> {
    Float(&'a FloatParam),
    Bool(&'a BoolParam),
    Choice(&'a ChoiceParam),
    Int(&'a IntParam),
}

impl<'a> ParamRef<'a> {
    /// Stable name
    pub fn name(&self) -> &'static str {
        match self {
            ParamRef::Float(p) => p.spec().name,
            ParamRef::Bool(p) => p.name,
            ParamRef::Choice(p) => p.name,
            ParamRef::Int(p) => p.name,
        }
    }

    /// Owning module; `None` for UI-only parameters
    pub fn option(&self) -> Option<DspOption> {
        match self {
            ParamRef::Float(p) => Some(p.id.option()),
            ParamRef::Bool(p) => Some(p.option),
            ParamRef::Choice(p) => Some(p.option),
            ParamRef::Int(_) => None,
        }
    }

    /// Current raw value as a number (bool = 0/1, choice = index)
    pub fn value(&self) -> f64 {
        match self {
            ParamRef::Float(p) => p.get() as f64,
            ParamRef::Bool(p) => {
                if p.get() {
                    1.0
                } else {
                    0.0
                }
            }
            ParamRef::Choice(p) => p.index() as f64,
            ParamRef::Int(p) => p.get() as f64,
        }
    }

    /// Default as a number
    pub fn default_value(&self) -> f64 {
        match self {
            ParamRef::Float(p) => p.spec().default as f64,
            ParamRef::Bool(_) | ParamRef::Choice(_) => 0.0,
            ParamRef::Int(p) => p.default as f64,
        }
    }

    /// Set from a number; out-of-range values are clamped
    pub fn set_value(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(FxError::InvalidParameter {
                param: self.name().to_string(),
                value: value.to_string(),
                expected: "a finite number".to_string(),
            });
        }

        match self {
            ParamRef::Float(p) => p.set(value as f32),
            ParamRef::Bool(p) => p.set(value >= 0.5),
            ParamRef::Choice(p) => p.set_index(value.round().max(0.0) as usize),
            ParamRef::Int(p) => p.set(value.round() as i32),
        }
        Ok(())
    }

    /// Human-readable range, for listings
    pub fn describe_range(&self) -> String {
        match self {
            ParamRef::Float(p) => {
                let spec = p.spec();
                format!("{} to {} {}", spec.min, spec.max, spec.unit)
                    .trim_end()
                    .to_string()
            }
            ParamRef::Bool(_) => "off/on".to_string(),
            ParamRef::Choice(p) => p.choices.join(" | "),
            ParamRef::Int(p) => format!("{} to {}", p.min, p.max),
        }
    }
}

impl fmt::Display for ParamRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRef::Bool(p) => write!(f, "{} = {}", p.name, if p.get() { "on" } else { "off" }),
            ParamRef::Choice(p) => write!(f, "{} = {}", p.name, p.selected_name()),
            other => write!(f, "{} = {}", other.name(), other.value()),
        }
    }
}

// ============================================================================
// Parameter set
// ============================================================================

/// All parameters of the processor
#[derive(Debug)]
pub struct ParameterSet {
    floats: [FloatParam; FloatParamId::COUNT],
    bypass: [BoolParam; DspOption::COUNT],
    ladder_mode: ChoiceParam,
    general_mode: ChoiceParam,
    selected_tab: IntParam,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self {
            floats: FloatParamId::ALL.map(FloatParam::new),
            bypass: [
                BoolParam::new("Phaser Bypass", DspOption::Phase),
                BoolParam::new("Chorus Bypass", DspOption::Chorus),
                BoolParam::new("Overdrive Bypass", DspOption::OverDrive),
                BoolParam::new("Ladder Filter Bypass", DspOption::LadderFilter),
                BoolParam::new("General Filter Bypass", DspOption::GeneralFilter),
            ],
            ladder_mode: ChoiceParam::new(
                "Ladder Filter Mode",
                DspOption::LadderFilter,
                LadderMode::choice_names(),
            ),
            general_mode: ChoiceParam::new(
                "General Filter Mode",
                DspOption::GeneralFilter,
                GeneralFilterMode::choice_names(),
            ),
            selected_tab: IntParam::new("Selected Tab", 0, DspOption::COUNT as i32 - 1, 1),
        }
    }

    pub fn float(&self, id: FloatParamId) -> &FloatParam {
        &self.floats[id.index()]
    }

    /// Raw (unsmoothed) value
    #[inline]
    pub fn get(&self, id: FloatParamId) -> f32 {
        self.floats[id.index()].get()
    }

    pub fn set(&self, id: FloatParamId, value: f32) {
        self.floats[id.index()].set(value);
    }

    pub fn is_bypassed(&self, option: DspOption) -> bool {
        self.bypass
            .get(option.index())
            .map(BoolParam::get)
            .unwrap_or(false)
    }

    pub fn set_bypassed(&self, option: DspOption, bypassed: bool) {
        if let Some(param) = self.bypass.get(option.index()) {
            param.set(bypassed);
        }
    }

    /// Bypass flags indexed by option
    #[inline]
    pub fn bypass_flags(&self) -> [bool; DspOption::COUNT] {
        [
            self.bypass[0].get(),
            self.bypass[1].get(),
            self.bypass[2].get(),
            self.bypass[3].get(),
            self.bypass[4].get(),
        ]
    }

    #[inline]
    pub fn ladder_mode(&self) -> LadderMode {
        LadderMode::from_index(self.ladder_mode.index())
    }

    pub fn set_ladder_mode(&self, mode: LadderMode) {
        let index = LadderMode::ALL.iter().position(|m| *m == mode).unwrap_or(0);
        self.ladder_mode.set_index(index);
    }

    #[inline]
    pub fn general_filter_mode(&self) -> GeneralFilterMode {
        GeneralFilterMode::from_index(self.general_mode.index())
    }

    pub fn set_general_filter_mode(&self, mode: GeneralFilterMode) {
        let index = GeneralFilterMode::ALL
            .iter()
            .position(|m| *m == mode)
            .unwrap_or(0);
        self.general_mode.set_index(index);
    }

    pub fn selected_tab(&self) -> i32 {
        self.selected_tab.get()
    }

    pub fn set_selected_tab(&self, tab: i32) {
        self.selected_tab.set(tab);
    }

    /// Handles belonging to one module, in display order
    pub fn params_for_option(&self, option: DspOption) -> Vec<ParamRef<'_>> {
        let mut params = Vec::new();
        match option {
            DspOption::LadderFilter => params.push(ParamRef::Choice(&self.ladder_mode)),
            DspOption::GeneralFilter => params.push(ParamRef::Choice(&self.general_mode)),
            _ => {}
        }
        params.extend(
            self.floats
                .iter()
                .filter(|p| p.id.option() == option)
                .map(ParamRef::Float),
        );
        if let Some(bypass) = self.bypass.get(option.index()) {
            params.push(ParamRef::Bool(bypass));
        }
        params
    }

    /// Every parameter: the tab selector, then each module in option order
    pub fn all(&self) -> Vec<ParamRef<'_>> {
        let mut params = vec![ParamRef::Int(&self.selected_tab)];
        for option in DspOption::ALL {
            params.extend(self.params_for_option(option));
        }
        params
    }

    /// Look a parameter up by stable name
    pub fn find(&self, name: &str) -> Option<ParamRef<'_>> {
        self.all().into_iter().find(|p| p.name() == name)
    }

    /// Set a parameter by stable name
    pub fn set_by_name(&self, name: &str, value: f64) -> Result<()> {
        let param = self.find(name).ok_or_else(|| FxError::UnknownParameter {
            name: name.to_string(),
        })?;
        param.set_value(value)
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}
