//! Dotted-path `key=value` switches (`--video.brightness=20`).
//!
//! Every settable key is declared once in [`SwitchRegistry::standard`] with
//! its constraint and a setter. A value is parsed and validated before the
//! setter runs, so a rejected switch leaves the configuration untouched.

use crate::error::SwitchError;
use crate::logging::{log, LogCategory, LogLevel};
use crate::settings::{
    AudioSampleRate, Configuration, Region, SettingsEnum, Theme, VideoAspectRatio,
    VideoFilterType,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

type EnumSetter = Box<dyn Fn(&mut Configuration, &str) + Send + Sync>;

/// Value type and validation rule of a switch
pub enum SwitchKind {
    Int {
        min: i32,
        max: i32,
        field: fn(&mut Configuration) -> &mut i32,
    },
    UInt {
        min: u32,
        max: u32,
        field: fn(&mut Configuration) -> &mut u32,
    },
    Float {
        min: f64,
        max: f64,
        field: fn(&mut Configuration) -> &mut f64,
    },
    Bool {
        field: fn(&mut Configuration) -> &mut bool,
    },
    /// `allowed` holds the accepted variant names, `set` applies a name
    /// already checked against it
    Enum {
        allowed: &'static [&'static str],
        set: EnumSetter,
    },
}

pub struct SwitchEntry {
    /// Help-text section, e.g. "Video"
    pub section: &'static str,
    /// Display key, e.g. `video.videoFilter`
    pub key: String,
    pub kind: SwitchKind,
}

impl SwitchEntry {
    /// `--video.brightness=[-100 - 100]`
    pub fn help_line(&self) -> String {
        let range = match &self.kind {
            SwitchKind::Int { min, max, .. } => format!("{} - {}", min, max),
            SwitchKind::UInt { min, max, .. } => format!("{} - {}", min, max),
            SwitchKind::Float { min, max, .. } => format!("{} - {}", min, max),
            SwitchKind::Bool { .. } => "true | false".to_string(),
            SwitchKind::Enum { allowed, .. } => allowed.join(" | "),
        };
        format!("--{}=[{}]", self.key, range)
    }

    fn apply(&self, config: &mut Configuration, value: &str) -> Result<(), SwitchError> {
        let invalid = || SwitchError::InvalidValue {
            key: self.key.clone(),
            value: value.to_string(),
        };
        let out_of_range = |min: &dyn ToString, max: &dyn ToString| SwitchError::OutOfRange {
            key: self.key.clone(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        };

        match &self.kind {
            SwitchKind::Int { min, max, field } => {
                let parsed: i32 = value.parse().map_err(|_| invalid())?;
                if !(*min..=*max).contains(&parsed) {
                    return Err(out_of_range(min, max));
                }
                *field(config) = parsed;
            }
            SwitchKind::UInt { min, max, field } => {
                let parsed: u32 = value.parse().map_err(|_| invalid())?;
                if !(*min..=*max).contains(&parsed) {
                    return Err(out_of_range(min, max));
                }
                *field(config) = parsed;
            }
            SwitchKind::Float { min, max, field } => {
                let parsed: f64 = value.parse().map_err(|_| invalid())?;
                if !parsed.is_finite() || parsed < *min || parsed > *max {
                    return Err(out_of_range(min, max));
                }
                *field(config) = parsed;
            }
            SwitchKind::Bool { field } => {
                *field(config) = match value.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid()),
                };
            }
            SwitchKind::Enum { allowed, set } => {
                let Some(name) = allowed.iter().find(|n| n.eq_ignore_ascii_case(value)) else {
                    return Err(SwitchError::NotAllowed {
                        key: self.key.clone(),
                        value: value.to_string(),
                    });
                };
                set(config, name);
            }
        }
        Ok(())
    }
}

fn switch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z0-9_A-Z.]+)=([a-z0-9_A-Z.\-]+)$").expect("switch pattern compiles")
    })
}

/// Split `key=value`, rejecting anything outside the switch alphabet
pub fn split_switch(switch: &str) -> Result<(&str, &str), SwitchError> {
    let captures = switch_pattern()
        .captures(switch.trim())
        .ok_or_else(|| SwitchError::Malformed(switch.to_string()))?;
    match (captures.get(1), captures.get(2)) {
        (Some(key), Some(value)) => Ok((key.as_str(), value.as_str())),
        _ => Err(SwitchError::Malformed(switch.to_string())),
    }
}

fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Lookup table from lower-cased dotted keys to switch entries
#[derive(Default)]
pub struct SwitchRegistry {
    entries: BTreeMap<String, SwitchEntry>,
    /// Sections in declaration order
    sections: Vec<&'static str>,
}

/// Registers the switches of one settings section
pub struct SectionBuilder<'a> {
    registry: &'a mut SwitchRegistry,
    section: &'static str,
    prefix: &'static str,
}

impl SectionBuilder<'_> {
    fn add(&mut self, name: &str, kind: SwitchKind) -> &mut Self {
        let key = format!("{}{}", self.prefix, camel_case(name));
        self.registry.insert(SwitchEntry {
            section: self.section,
            key,
            kind,
        });
        self
    }

    pub fn int(
        &mut self,
        name: &str,
        min: i32,
        max: i32,
        field: fn(&mut Configuration) -> &mut i32,
    ) -> &mut Self {
        self.add(name, SwitchKind::Int { min, max, field })
    }

    pub fn uint(
        &mut self,
        name: &str,
        min: u32,
        max: u32,
        field: fn(&mut Configuration) -> &mut u32,
    ) -> &mut Self {
        self.add(name, SwitchKind::UInt { min, max, field })
    }

    pub fn float(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
        field: fn(&mut Configuration) -> &mut f64,
    ) -> &mut Self {
        self.add(name, SwitchKind::Float { min, max, field })
    }

    pub fn bool(&mut self, name: &str, field: fn(&mut Configuration) -> &mut bool) -> &mut Self {
        self.add(name, SwitchKind::Bool { field })
    }

    /// Enum switch accepting every variant
    pub fn enumeration<E: SettingsEnum>(
        &mut self,
        name: &str,
        field: fn(&mut Configuration) -> &mut E,
    ) -> &mut Self {
        self.enumeration_of(name, E::NAMES, field)
    }

    /// Enum switch restricted to `allowed` variant names
    pub fn enumeration_of<E: SettingsEnum>(
        &mut self,
        name: &str,
        allowed: &'static [&'static str],
        field: fn(&mut Configuration) -> &mut E,
    ) -> &mut Self {
        let set: EnumSetter = Box::new(move |config: &mut Configuration, value: &str| {
            if let Some(variant) = E::from_name(value) {
                *field(config) = variant;
            }
        });
        self.add(name, SwitchKind::Enum { allowed, set })
    }
}

impl SwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, entry: SwitchEntry) {
        if !self.sections.contains(&entry.section) {
            self.sections.push(entry.section);
        }
        self.entries.insert(entry.key.to_ascii_lowercase(), entry);
    }

    /// Start a section; keys are `prefix` + camelCased field name
    pub fn section(&mut self, section: &'static str, prefix: &'static str) -> SectionBuilder<'_> {
        SectionBuilder {
            registry: self,
            section,
            prefix,
        }
    }

    /// Every switch the front-end understands
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry
            .section("Audio", "audio.")
            .bool("EnableAudio", |c| &mut c.audio.enable_audio)
            .uint("MasterVolume", 0, 100, |c| &mut c.audio.master_volume)
            .uint("AudioLatency", 15, 300, |c| &mut c.audio.audio_latency)
            .enumeration::<AudioSampleRate>("SampleRate", |c| &mut c.audio.sample_rate)
            .bool("MuteSoundInBackground", |c| &mut c.audio.mute_sound_in_background)
            .bool("ReduceSoundInFastForward", |c| {
                &mut c.audio.reduce_sound_in_fast_forward
            });

        registry
            .section("Emulation", "emulation.")
            .uint("EmulationSpeed", 0, 5000, |c| &mut c.emulation.emulation_speed)
            .uint("TurboSpeed", 0, 5000, |c| &mut c.emulation.turbo_speed)
            .uint("RewindSpeed", 0, 5000, |c| &mut c.emulation.rewind_speed)
            .uint("RunAheadFrames", 0, 10, |c| &mut c.emulation.run_ahead_frames)
            .enumeration::<Region>("Region", |c| &mut c.emulation.region);

        registry
            .section("Input", "input.")
            .uint("ControllerDeadzoneSize", 0, 4, |c| {
                &mut c.input.controller_deadzone_size
            })
            .uint("MouseSensitivity", 0, 9, |c| &mut c.input.mouse_sensitivity)
            .bool("AllowBackgroundInput", |c| &mut c.input.allow_background_input);

        registry
            .section("Video", "video.")
            .enumeration_of::<VideoFilterType>(
                "VideoFilter",
                &["None", "Ntsc", "HQ2x", "HQ3x", "Scale2x"],
                |c| &mut c.video.video_filter,
            )
            .enumeration::<VideoAspectRatio>("AspectRatio", |c| &mut c.video.aspect_ratio)
            .float("CustomAspectRatio", 0.1, 5.0, |c| &mut c.video.custom_aspect_ratio)
            .int("Brightness", -100, 100, |c| &mut c.video.brightness)
            .int("Contrast", -100, 100, |c| &mut c.video.contrast)
            .int("Saturation", -100, 100, |c| &mut c.video.saturation)
            .uint("ScanlineIntensity", 0, 100, |c| &mut c.video.scanline_intensity)
            .bool("UseBilinearInterpolation", |c| {
                &mut c.video.use_bilinear_interpolation
            })
            .bool("VerticalSync", |c| &mut c.video.vertical_sync)
            .bool("IntegerFpsMode", |c| &mut c.video.integer_fps_mode);

        registry
            .section("Preferences", "preferences.")
            .enumeration::<Theme>("Theme", |c| &mut c.preferences.theme)
            .bool("PauseWhenInBackground", |c| {
                &mut c.preferences.pause_when_in_background
            })
            .bool("ShowFps", |c| &mut c.preferences.show_fps)
            .bool("SeparateSaveStatesByPatch", |c| {
                &mut c.preferences.separate_save_states_by_patch
            });

        registry
            .section("Debugger", "debug.debugger.")
            .bool("ShowWatchHud", |c| &mut c.debug.debugger.show_watch_hud)
            .int("WatchHudMaxEntries", 0, 64, |c| {
                &mut c.debug.debugger.watch_hud_max_entries
            })
            .bool("BreakOnUninitRead", |c| &mut c.debug.debugger.break_on_uninit_read);

        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup of a dotted key
    pub fn get(&self, key: &str) -> Option<&SwitchEntry> {
        self.entries.get(&key.to_ascii_lowercase())
    }

    /// Apply one `key=value` switch to `config`.
    pub fn process_switch(&self, config: &mut Configuration, switch: &str) -> Result<(), SwitchError> {
        let result = split_switch(switch).and_then(|(key, value)| {
            let entry = self
                .get(key)
                .ok_or_else(|| SwitchError::UnknownKey(key.to_string()))?;
            entry.apply(config, value)
        });

        match &result {
            Ok(()) => log(LogCategory::Switches, LogLevel::Debug, || {
                format!("[UI] Applied switch: {}", switch)
            }),
            Err(e) => log(LogCategory::Switches, LogLevel::Info, || {
                format!("[UI] Rejected switch: {}", e)
            }),
        }
        result
    }

    /// Help text per section, in declaration order
    pub fn help_sections(&self) -> Vec<(&'static str, String)> {
        self.sections
            .iter()
            .map(|&section| {
                let mut text = String::new();
                let mut entries: Vec<_> = self
                    .entries
                    .values()
                    .filter(|entry| entry.section == section)
                    .collect();
                entries.sort_by(|a, b| a.key.cmp(&b.key));
                for entry in entries {
                    let _ = writeln!(text, "{}", entry.help_line());
                }
                (section, text)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_switch() {
        assert_eq!(split_switch("video.brightness=-20"), Ok(("video.brightness", "-20")));
        assert!(split_switch("video.brightness").is_err());
        assert!(split_switch("video.brightness=1;rm").is_err());
        assert!(split_switch("=5").is_err());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let registry = SwitchRegistry::standard();
        let mut config = Configuration::default();

        registry
            .process_switch(&mut config, "VIDEO.BRIGHTNESS=25")
            .unwrap();
        registry
            .process_switch(&mut config, "audio.enableaudio=FALSE")
            .unwrap();

        assert_eq!(config.video.brightness, 25);
        assert!(!config.audio.enable_audio);
    }

    #[test]
    fn test_nested_path() {
        let registry = SwitchRegistry::standard();
        let mut config = Configuration::default();
        registry
            .process_switch(&mut config, "debug.debugger.showWatchHud=true")
            .unwrap();
        registry
            .process_switch(&mut config, "debug.debugger.watchHudMaxEntries=12")
            .unwrap();
        assert!(config.debug.debugger.show_watch_hud);
        assert_eq!(config.debug.debugger.watch_hud_max_entries, 12);
    }

    #[test]
    fn test_rejections_leave_config_untouched() {
        let registry = SwitchRegistry::standard();
        let mut config = Configuration::default();
        let before = config.clone();

        let cases = [
            ("video.brightness=101", "out of range"),
            ("audio.masterVolume=-1", "negative unsigned"),
            ("audio.masterVolume=loud", "not a number"),
            ("video.customAspectRatio=9.5", "float out of range"),
            ("video.verticalSync=yes", "not a bool"),
            ("video.videoFilter=Prescale4x", "not in allowed values"),
            ("video.nope=1", "unknown key"),
            ("video=1", "section is not settable"),
            ("video.brightness", "no value"),
        ];
        for (switch, why) in cases {
            assert!(
                registry.process_switch(&mut config, switch).is_err(),
                "{} should be rejected ({})",
                switch,
                why
            );
        }
        assert_eq!(config, before);
    }

    #[test]
    fn test_error_kinds() {
        let registry = SwitchRegistry::standard();
        let mut config = Configuration::default();

        assert_eq!(
            registry.process_switch(&mut config, "video.nope=1"),
            Err(SwitchError::UnknownKey("video.nope".to_string()))
        );
        assert!(matches!(
            registry.process_switch(&mut config, "emulation.runAheadFrames=11"),
            Err(SwitchError::OutOfRange { .. })
        ));
        assert!(matches!(
            registry.process_switch(&mut config, "video.videoFilter=Prescale2x"),
            Err(SwitchError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_enum_values() {
        let registry = SwitchRegistry::standard();
        let mut config = Configuration::default();

        registry
            .process_switch(&mut config, "video.videofilter=hq2x")
            .unwrap();
        registry
            .process_switch(&mut config, "emulation.region=pal")
            .unwrap();
        registry
            .process_switch(&mut config, "video.customAspectRatio=1.25")
            .unwrap();

        assert_eq!(config.video.video_filter, VideoFilterType::HQ2x);
        assert_eq!(config.emulation.region, Region::Pal);
        assert_eq!(config.video.custom_aspect_ratio, 1.25);
    }

    #[test]
    fn test_help_sections() {
        let registry = SwitchRegistry::standard();
        let sections = registry.help_sections();
        let names: Vec<_> = sections.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["Audio", "Emulation", "Input", "Video", "Preferences", "Debugger"]
        );

        let video = &sections[3].1;
        assert!(video.contains("--video.brightness=[-100 - 100]"));
        assert!(video.contains("--video.verticalSync=[true | false]"));
        assert!(video.contains("--video.videoFilter=[None | Ntsc | HQ2x | HQ3x | Scale2x]"));
    }
}
