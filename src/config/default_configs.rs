use crate::config::collection_config::{
    CategoryConfig, CollectionConfig, EventLogConfig, ExclusionConfig, SourceConfig,
};
use crate::constants::DEFAULT_ARCHIVE_PREFIX;

fn paths(raw: &[&str]) -> Vec<SourceConfig> {
    raw.iter()
        .map(|p| SourceConfig::Path { path: p.to_string() })
        .collect()
}

fn category(name: &str, sources: Vec<SourceConfig>) -> CategoryConfig {
    CategoryConfig {
        name: name.into(),
        sources,
        size_limited: true,
    }
}

impl Default for CollectionConfig {
    /// N-able agent diagnostic locations on a Windows endpoint
    fn default() -> Self {
        CollectionConfig {
            version: "1.0".into(),
            description: "Default N-able agent diagnostic collection".into(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.into(),
            exclusions: ExclusionConfig::default(),
            event_log: EventLogConfig::default(),
            categories: vec![
                category(
                    "Automation Manager",
                    paths(&[
                        r"C:\Program Files (x86)\N-able Technologies\AutomationManager\logs",
                        r"C:\Program Files (x86)\Advanced Monitoring Agent\scriptrunner",
                        r"C:\ProgramData\N-able Technologies\AutomationManager\log",
                        r"C:\ProgramData\N-able Technologies\AutomationManager\scripts",
                    ]),
                ),
                category("MSP Core", paths(&[r"C:\Program Files (x86)\Msp Agent"])),
                category(
                    "Vulnerability Management",
                    paths(&[
                        r"C:\Program Files (x86)\Msp Agent\Components\software-scanner",
                        r"C:\ProgramData\N-able Technologies\Vulnerability Management\logs",
                    ]),
                ),
                category(
                    "Take Control Console",
                    paths(&[r"%LOCALAPPDATA%\BeAnywhere Support Express\Console\Logs"]),
                ),
                category(
                    "Take Control StandAlone Agent",
                    paths(&[r"%ALLUSERSPROFILE%\GetSupportService\Logs"]),
                ),
                category(
                    "N-sight Agent",
                    paths(&[
                        r"C:\Program Files (x86)\Advanced Monitoring Agent",
                        r"C:\Program Files (x86)\Advanced Monitoring Agent GP",
                        r"%ProgramData%\MspPlatform\PME\log",
                        r"%ProgramData%\MspPlatform\FileCacheServiceAgent\log",
                        r"%ProgramData%\MspPlatform\PME.Agent.PmeService\log",
                        r"%ProgramData%\MspPlatform\RequestHandlerAgent\log",
                        r"%ProgramData%\AdvancedMonitoringAgentWebProtection",
                        r"%ProgramData%\AdvancedMonitoringAgentNetworkManagement",
                        r"%ProgramData%\GetSupportService_LOGICnow",
                    ]),
                ),
                category(
                    "Take Control Viewer",
                    paths(&[r"%LOCALAPPDATA%\Take Control Viewer\Logs"]),
                ),
                // Exported logs are routinely larger than the size ceiling
                CategoryConfig {
                    name: "Event Viewer Logs".into(),
                    sources: vec![SourceConfig::EventLogs],
                    size_limited: false,
                },
            ],
        }
    }
}
