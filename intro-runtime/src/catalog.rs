//! # Catalog 模块
//!
//! 内置开场动画的时间线。
//!
//! 每种开场动画都只是一份阶段列表，画面由宿主按阶段名渲染。

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::SequenceResult;
use crate::stage::{Stage, StageEffect};
use crate::timeline::{OffsetPolicy, Timeline};

/// 开场动画种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoaderKind {
    /// 时间倒流（站点默认）
    #[default]
    TimeRewind,
    /// 安全运营中心大屏
    Soc,
    AiDefense,
    CyberCommand,
    Forensics,
    NetworkAnalysis,
    CyberDefense,
    CyberHelmet,
    Firewall,
    InsideFirewall,
    /// 赛博朋克终端
    Terminal,
    ZeroDay,
    Singularity,
}

impl LoaderKind {
    /// 全部种类
    pub const ALL: [LoaderKind; 13] = [
        LoaderKind::TimeRewind,
        LoaderKind::Soc,
        LoaderKind::AiDefense,
        LoaderKind::CyberCommand,
        LoaderKind::Forensics,
        LoaderKind::NetworkAnalysis,
        LoaderKind::CyberDefense,
        LoaderKind::CyberHelmet,
        LoaderKind::Firewall,
        LoaderKind::InsideFirewall,
        LoaderKind::Terminal,
        LoaderKind::ZeroDay,
        LoaderKind::Singularity,
    ];

    /// 名称（同时也是时间线 ID）
    pub fn name(&self) -> &'static str {
        match self {
            Self::TimeRewind => "time-rewind",
            Self::Soc => "soc",
            Self::AiDefense => "ai-defense",
            Self::CyberCommand => "cyber-command",
            Self::Forensics => "forensics",
            Self::NetworkAnalysis => "network-analysis",
            Self::CyberDefense => "cyber-defense",
            Self::CyberHelmet => "cyber-helmet",
            Self::Firewall => "firewall",
            Self::InsideFirewall => "inside-firewall",
            Self::Terminal => "terminal",
            Self::ZeroDay => "zero-day",
            Self::Singularity => "singularity",
        }
    }
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 未知的开场动画名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLoader(pub String);

impl std::fmt::Display for UnknownLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "未知的开场动画: {}", self.0)
    }
}

impl std::error::Error for UnknownLoader {}

impl FromStr for LoaderKind {
    type Err = UnknownLoader;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        LoaderKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| UnknownLoader(s.to_string()))
    }
}

/// 构建某种开场动画的时间线
///
/// 内置时间线总是以 [`OffsetPolicy::Reject`] 构建。
pub fn timeline(kind: LoaderKind) -> SequenceResult<Timeline> {
    let (capacity, stages) = match kind {
        LoaderKind::TimeRewind => (7, time_rewind()),
        LoaderKind::Soc => (8, soc()),
        LoaderKind::AiDefense => (7, ai_defense()),
        LoaderKind::CyberCommand => (7, cyber_command()),
        LoaderKind::Forensics => (7, forensics()),
        LoaderKind::NetworkAnalysis => (7, network_analysis()),
        LoaderKind::CyberDefense => (7, cyber_defense()),
        LoaderKind::CyberHelmet => (7, cyber_helmet()),
        LoaderKind::Firewall => (7, firewall()),
        LoaderKind::InsideFirewall => (7, inside_firewall()),
        LoaderKind::Terminal => (7, terminal()),
        LoaderKind::ZeroDay => (8, zero_day()),
        LoaderKind::Singularity => (7, singularity()),
    };

    Timeline::builder(kind.name())
        .log_capacity(capacity)
        .offset_policy(OffsetPolicy::Reject)
        .stages(stages)
        .build()
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn at(name: &str, offset_ms: u64) -> Stage {
    Stage::at_ms(name, offset_ms)
}

/// 按字符数计算打字时长
fn per_char(text: &str, char_ms: u64) -> Duration {
    ms(text.chars().count() as u64 * char_ms)
}

fn time_rewind() -> Vec<Stage> {
    vec![
        at("chaos", 0)
            .with(StageEffect::status("TEMPORAL ANOMALY"))
            .with(StageEffect::ramp_eased("glitch", 0.0, 1.0, ms(2500), Easing::EaseInQuad)),
        at("freeze", 3000)
            .with(StageEffect::status("TIME FROZEN"))
            .with(StageEffect::flag("frozen")),
        at("rewind", 3200)
            .with(StageEffect::status("REWINDING..."))
            .with(StageEffect::clear_flag("frozen"))
            .with(StageEffect::ramp("glitch", 1.0, 0.0, ms(1500)))
            .with(StageEffect::ramp("scanline", 0.0, 50.0, ms(2000))),
        at("stable", 5500)
            .with(StageEffect::status("TIMELINE RESTORED"))
            .with(StageEffect::flag("show_text")),
        at("complete", 8500).terminal(),
    ]
}

fn soc() -> Vec<Stage> {
    let command = "assume-control --force";
    vec![
        at("watch", 0)
            .with(StageEffect::status("MONITORING"))
            .with(StageEffect::ticker(
                "feed",
                ms(400),
                [
                    "SSH_BRUTE_FORCE",
                    "SQL_INJECTION",
                    "XSS_PAYLOAD",
                    "RCE_ATTEMPT",
                    "DDoS_SYN_FLOOD",
                    "PORT_SCAN",
                    "MALWARE_C2",
                ],
            )),
        at("terminal", 2500).with(StageEffect::flag("terminal")),
        at("takeover", 3000).with(StageEffect::type_text("command", command, ms(1500))),
        at("secure", 5000)
            .with(StageEffect::stop_ticker("feed"))
            .with(StageEffect::status("SECURED"))
            .with(StageEffect::flag("secure")),
        at("access", 5500)
            .with(StageEffect::status("ACCESS GRANTED"))
            .with(StageEffect::flag("access_granted")),
        at("complete", 8000).terminal(),
    ]
}

fn ai_defense() -> Vec<Stage> {
    vec![
        at("idle", 0).with(StageEffect::status("STANDBY")),
        at("assembly", 1000).with(StageEffect::status("ASSEMBLY")),
        at("handshake", 1100).with(StageEffect::log("INIT_NEURAL_HANDSHAKE...")),
        at("nodes", 1500).with(StageEffect::log("CONSTRUCTING_NODES...")),
        at("analysis", 3000)
            .with(StageEffect::status("ANALYSIS"))
            .with(StageEffect::log("SCANNING_HOSTUAL_ENVIRONMENT..."))
            .with(StageEffect::ramp("scan", 0.0, 100.0, ms(2000))),
        at("identification", 5000).with(StageEffect::status("IDENTIFICATION")),
        at("biometric", 5100).with(StageEffect::log("BIOMETRIC_SIGNATURE_DETECTED")),
        at("validate", 5500).with(StageEffect::log("VALIDATING_ACCESS_KEY...")),
        at("verified", 6500)
            .with(StageEffect::status("VERIFIED"))
            .with(StageEffect::flag("verified"))
            .with(StageEffect::log("ACCESS_GRANTED: ADMIN_PRIORITY_1")),
        at("complete", 8500).terminal(),
    ]
}

fn cyber_command() -> Vec<Stage> {
    vec![
        at("boot", 0).with(StageEffect::status("BOOT")),
        at("assembly", 500).with(StageEffect::status("ASSEMBLING COMMAND GRID")),
        at("scan", 2500)
            .with(StageEffect::status("VERIFYING INTEGRITY"))
            .with(StageEffect::ramp("integrity", 0.0, 100.0, ms(2000))),
        at("split", 5000)
            .with(StageEffect::status("INTEGRITY VERIFIED"))
            .with(StageEffect::flag("split")),
        at("reveal", 5500).with(StageEffect::flag("reveal")),
        at("complete", 8000).terminal(),
    ]
}

fn forensics() -> Vec<Stage> {
    let mut stages = vec![
        at("scatter", 0).with(StageEffect::status("EVIDENCE SCATTERED")),
        at("reconstruct", 1500)
            .with(StageEffect::status("RECONSTRUCTING"))
            .with(StageEffect::ramp("progress", 0.0, 100.0, ms(1500))),
    ];

    let files = [
        "packet_capture.pcap",
        "heap_dump.bin",
        "access_logs.db",
        "sys_core.dmp",
    ];
    for (i, file) in files.iter().enumerate() {
        stages.push(
            at(&format!("file-{}", i + 1), 2000 + 600 * i as u64)
                .with(StageEffect::log(format!("RECOVERED {}", file))),
        );
    }

    stages.extend([
        at("decrypt", 4000)
            .with(StageEffect::status("DECRYPTING"))
            .with(StageEffect::flag("decrypt")),
        at("reveal", 5500)
            .with(StageEffect::status("CASE CLOSED"))
            .with(StageEffect::flag("reveal")),
        at("complete", 7000).terminal(),
    ]);
    stages
}

fn network_analysis() -> Vec<Stage> {
    vec![
        at("scan", 0).with(StageEffect::status("SCANNING")),
        at("monitor", 1000)
            .with(StageEffect::log("System initialized."))
            .with(StageEffect::log("Monitoring traffic...")),
        at("attack", 3000)
            .with(StageEffect::status("UNDER ATTACK"))
            .with(StageEffect::flag("alert"))
            .with(StageEffect::log("[ALERT] Unusual traffic detected."))
            .with(StageEffect::log("[WARNING] SSH Brute Force attempt (IP: 192.168.x.x)")),
        at("critical", 4500).with(StageEffect::log("[CRITICAL] SQL Injection payload identified.")),
        at("defense", 5500)
            .with(StageEffect::status("DEFENDING"))
            .with(StageEffect::log("Deploying counter-measures..."))
            .with(StageEffect::log("Firewall rules updated. IP Blocked."))
            .with(StageEffect::log("Sanitizing inputs...")),
        at("stable", 7500)
            .with(StageEffect::status("STABLE"))
            .with(StageEffect::clear_flag("alert"))
            .with(StageEffect::log("Threat neutralized."))
            .with(StageEffect::log("System Integrity: 100%")),
        at("complete", 10_500).terminal(),
    ]
}

fn cyber_defense() -> Vec<Stage> {
    vec![
        at("dark", 0),
        at("init", 500).with(StageEffect::status("INITIALIZING SECURE ENVIRONMENT...")),
        at("integrity", 2500).with(StageEffect::status("SYSTEM INTEGRITY CHECK...")),
        at("authenticated", 4000)
            .with(StageEffect::status("OPERATOR AUTHENTICATED."))
            .with(StageEffect::flag("authenticated")),
        at("reveal", 5000).with(StageEffect::flag("reveal")),
        at("complete", 7500).terminal(),
    ]
}

fn cyber_helmet() -> Vec<Stage> {
    vec![
        at("dormant", 0),
        at("active", 1000)
            .with(StageEffect::flag("visor"))
            .with(StageEffect::status("INITIALIZING SECURE ENVIRONMENT...")),
        at("intel", 3000).with(StageEffect::status("LOADING THREAT INTELLIGENCE...")),
        at("identity", 5000)
            .with(StageEffect::status("IDENTITY CONFIRMED."))
            .with(StageEffect::flag("confirmed")),
        at("transition", 6500).with(StageEffect::ramp("fade", 0.0, 1.0, ms(1000))),
        at("complete", 7500).terminal(),
    ]
}

fn firewall() -> Vec<Stage> {
    vec![
        at("scan", 0).with(StageEffect::status("SCANNING...")),
        at("detect", 2500)
            .with(StageEffect::status("EXTERNAL ENTITY DETECTED"))
            .with(StageEffect::ramp("threat", 0.0, 99.0, ms(1500))),
        at("identify", 4000)
            .with(StageEffect::status("IDENTIFYING..."))
            .with(StageEffect::value("threat", 0.0)),
        at("verified", 5000)
            .with(StageEffect::status("VERIFIED: ADMIN"))
            .with(StageEffect::log("ACCESS GRANTED"))
            .with(StageEffect::flag("verified")),
        at("open", 5800)
            .with(StageEffect::flag("open"))
            .with(StageEffect::ramp_eased("gate", 0.0, 1.0, ms(3000), Easing::EaseInOutCubic)),
        at("complete", 8800).terminal(),
    ]
}

fn inside_firewall() -> Vec<Stage> {
    let detected = "EXTERNAL ENTITY DETECTED";
    let typed = 3500 + per_char(detected, 30).as_millis() as u64;
    let feed = typed + 500;
    let assessed = feed + 1500;
    let welcome = assessed + 800;
    let open = welcome + 800;
    let fly = open + 500;

    vec![
        at("fly-in", 0).with(StageEffect::ramp_eased(
            "approach",
            0.0,
            1.0,
            ms(3500),
            Easing::EaseOutCubic,
        )),
        at("detect", 3500).with(StageEffect::type_text("alert", detected, per_char(detected, 30))),
        at("threat-feed", feed)
            .with(StageEffect::ramp("threat", 0.0, 100.0, ms(1500)))
            .with(StageEffect::ticker(
                "scan",
                ms(300),
                ["SCANNING SIGNATURE...", "CROSS-REFERENCING...", "NO MATCH FOUND"],
            )),
        at("assessed", assessed)
            .with(StageEffect::stop_ticker("scan"))
            .with(StageEffect::status("THREAT ASSESSMENT: NEGATIVE")),
        at("welcome", welcome)
            .with(StageEffect::status("WELCOME, USER."))
            .with(StageEffect::flag("granted")),
        at("open", open).with(StageEffect::ramp("doors", 0.0, 1.0, ms(1500))),
        at("fly-through", fly).with(StageEffect::ramp_eased(
            "fly",
            0.0,
            1.0,
            ms(2000),
            Easing::EaseInCubic,
        )),
        at("complete", fly + 2000).terminal(),
    ]
}

fn terminal() -> Vec<Stage> {
    const CHAR_MS: u64 = 80;
    let commands: [(&str, &[&str]); 3] = [
        ("whoami", &["Full Stack Developer & Cybersecurity Enthusiast"]),
        (
            "skills --list",
            &["Building efficient webapps | Securing applications with cyber skills"],
        ),
        (
            "launch_portfolio",
            &["Initializing system...", "Loading modules... [OK]"],
        ),
    ];

    let mut stages = vec![at("boot", 0).with(StageEffect::status("root@portfolio:~$"))];
    let mut cursor = 500;
    for (i, (command, outputs)) in commands.iter().enumerate() {
        stages.push(
            at(&format!("type-{}", i + 1), cursor)
                .with(StageEffect::type_text("command", *command, per_char(command, CHAR_MS))),
        );
        cursor += per_char(command, CHAR_MS).as_millis() as u64 + 300;

        let mut output = at(&format!("output-{}", i + 1), cursor)
            .with(StageEffect::log(format!("$ {}", command)));
        for line in *outputs {
            output = output.with(StageEffect::log(*line));
        }
        stages.push(output);
        cursor += 500;
    }

    stages.push(at("exit", cursor).with(StageEffect::ramp("fade", 1.0, 0.0, ms(1000))));
    stages.push(at("complete", cursor + 1000).terminal());
    stages
}

fn zero_day() -> Vec<Stage> {
    let payload = "' OR 1=1; --";
    let lines = [
        "root@kali:~# nc -lvnp 4444",
        "listening on [any] 4444 ...",
        "connect to [192.168.1.105] from (UNKNOWN) [10.10.10.5] 58322",
        "GET /shell.php HTTP/1.1",
        "Host: vulnerable-target.com",
        "Connection Established.",
        "Access Granted.",
    ];

    let mut stages = vec![
        at("browser", 0).with(StageEffect::status("BROWSER")),
        at("inject", 800).with(StageEffect::type_text("payload", payload, per_char(payload, 100))),
        at("glitch", 3500).with(StageEffect::flag("glitch")),
        at("terminal", 4000)
            .with(StageEffect::clear_flag("glitch"))
            .with(StageEffect::status("TERMINAL")),
    ];
    for (i, line) in lines.iter().enumerate() {
        stages.push(at(&format!("line-{}", i + 1), 4500 + 500 * i as u64).with(StageEffect::log(*line)));
    }
    stages.push(
        at("reveal", 8500)
            .with(StageEffect::status("REVEAL"))
            .with(StageEffect::flag("reveal")),
    );
    stages.push(at("complete", 11_000).terminal());
    stages
}

fn singularity() -> Vec<Stage> {
    vec![
        at("collapse", 0).with(StageEffect::ramp_eased(
            "camera_z",
            20.0,
            12.0,
            ms(4000),
            Easing::EaseInOutQuad,
        )),
        at("stabilize", 3000).with(StageEffect::ramp("particles", 0.0, 1.0, ms(2000))),
        at("glass", 3500).with(StageEffect::ramp("core", 0.0, 1.0, ms(2000))),
        at("reveal", 5000)
            .with(StageEffect::flag("show_text"))
            .with(StageEffect::status("SECURITY SINGULARITY REACHED"))
            .with(StageEffect::ramp_eased("camera_z", 12.0, 8.0, ms(2000), Easing::EaseOutQuad)),
        at("complete", 8000).terminal(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::analyze_timeline;
    use crate::sequencer::SequenceHandle;

    #[test]
    fn test_all_timelines_are_clean() {
        for kind in LoaderKind::ALL {
            let timeline = timeline(kind).unwrap();
            let result = analyze_timeline(&timeline);
            assert!(result.is_empty(), "{}: {:?}", kind, result.diagnostics);
            assert_eq!(timeline.id(), kind.name());
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in LoaderKind::ALL {
            assert_eq!(kind.name().parse::<LoaderKind>(), Ok(kind));
        }
        assert_eq!("ZERO_DAY".parse::<LoaderKind>(), Ok(LoaderKind::ZeroDay));
        assert!("matrix".parse::<LoaderKind>().is_err());
    }

    #[test]
    fn test_completion_offsets() {
        let secs: Vec<(&str, u128)> = [
            LoaderKind::TimeRewind,
            LoaderKind::Soc,
            LoaderKind::AiDefense,
            LoaderKind::NetworkAnalysis,
            LoaderKind::Singularity,
        ]
        .into_iter()
        .map(|k| (k.name(), timeline(k).unwrap().completion_offset().as_millis()))
        .collect();

        assert_eq!(
            secs,
            [
                ("time-rewind", 8500),
                ("soc", 8000),
                ("ai-defense", 8500),
                ("network-analysis", 10_500),
                ("singularity", 8000),
            ]
        );
    }

    #[test]
    fn test_soc_feed_stops_when_secured() {
        let handle = SequenceHandle::new(timeline(LoaderKind::Soc).unwrap(), || {});
        handle.start();
        handle.tick(ms(4900));
        let before = handle.snapshot();
        // 12 行里只保留最后 8 行
        assert_eq!(before.log().len(), 8);
        assert_eq!(before.text("command"), Some("assume-control --force"));

        handle.tick(ms(3000));
        let after = handle.snapshot();
        assert_eq!(after.log(), before.log());
        assert!(after.flag("access_granted"));
    }

    #[test]
    fn test_terminal_log_order() {
        let handle = SequenceHandle::new(timeline(LoaderKind::Terminal).unwrap(), || {});
        handle.start();
        handle.tick(ms(60_000));

        let log: Vec<String> = handle.snapshot().log().iter().map(str::to_string).collect();
        assert_eq!(
            log,
            [
                "$ whoami",
                "Full Stack Developer & Cybersecurity Enthusiast",
                "$ skills --list",
                "Building efficient webapps | Securing applications with cyber skills",
                "$ launch_portfolio",
                "Initializing system...",
                "Loading modules... [OK]",
            ]
        );
        assert_eq!(handle.with(|s| s.intro().value("fade")), Some(0.0));
    }
}
