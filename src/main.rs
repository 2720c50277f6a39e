use chrono::Utc;
use clap::{Arg, ArgMatches, Command};
use comment_triage::article_titles::ArticleTitles;
use comment_triage::detection::{run_submission_detectors, Detectors};
use comment_triage::query::{ActivityQuery, MetricsQuery, QueueQuery};
use comment_triage::service::ModerationService;
use comment_triage::source::SnapshotSource;
use comment_triage::EngineConfig;
use log::LevelFilter;
use serde::Serialize;
use std::collections::HashMap;
use std::process;

const DEFAULT_CONFIG_PATH: &str = "/etc/comment-triage.yaml";

/// CLI options forwarded as raw query parameters, validated by `query`.
const QUERY_PARAMS: [(&str, &str); 7] = [
    ("limit", "limit"),
    ("offset", "offset"),
    ("status", "status"),
    ("flag-type", "flagType"),
    ("trigger-source", "triggerSource"),
    ("article", "articleSlug"),
    ("window", "window"),
];

fn main() {
    let matches = Command::new("comment-triage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Comment moderation triage: severity, queue status and moderation views")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and compile detector patterns")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("snapshot")
                .short('s')
                .long("snapshot")
                .value_name("FILE")
                .help("JSON snapshot with flags, reactions and article titles")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("view")
                .long("view")
                .value_name("VIEW")
                .help("Which view to print")
                .value_parser(["queue", "activity", "metrics"])
                .default_value("queue"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .help("Items per page (1-100)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_name("N")
                .help("Queue items to skip")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .value_name("STATUS")
                .help("Queue status filter (open, triage, escalated, resolved)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("flag-type")
                .long("flag-type")
                .value_name("TYPE")
                .help("Flag type filter, e.g. manual_report")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("trigger-source")
                .long("trigger-source")
                .value_name("SOURCE")
                .help("Trigger source filter (system, user, moderator)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("article")
                .long("article")
                .value_name("SLUG")
                .help("Only flags on this article")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .value_name("WINDOW")
                .help("Time window (24h, 7d, 30d, 90d)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("include-resolved")
                .long("include-resolved")
                .help("Keep resolved comments in the queue")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-comment")
                .long("check-comment")
                .value_name("TEXT")
                .help("Run the submission detectors against a comment text")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let loaded = load_config(config_path);

    // --verbose wins over the configured level
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        loaded
            .as_ref()
            .ok()
            .and_then(|config| config.as_ref())
            .and_then(|config| config.logging.as_ref())
            .and_then(|logging| logging.level.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match loaded {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::warn!("Configuration file '{config_path}' not found, using default configuration");
            EngineConfig::default()
        }
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let detectors = match Detectors::from_config(&config.detection) {
        Ok(detectors) => detectors,
        Err(e) => {
            eprintln!("Error building detectors: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        println!("🔍 Testing configuration...");
        println!();
        println!("Banned phrases: {}", config.detection.banned_phrases.len());
        println!(
            "Link spam: {} (max {} links)",
            enabled(config.detection.link_spam.enabled),
            config.detection.link_spam.max_links
        );
        println!(
            "Dislike threshold: {} (min {} dislikes, ratio {})",
            enabled(config.detection.dislike_threshold.enabled),
            config.detection.dislike_threshold.min_dislikes,
            config.detection.dislike_threshold.ratio
        );
        println!(
            "Report threshold: {} unique reporters",
            config.detection.report_threshold
        );
        println!("✅ Configuration valid, all patterns compiled");
        return;
    }

    if let Some(text) = matches.get_one::<String>("check-comment") {
        match run_submission_detectors(&detectors, text) {
            Some(draft) => print_json(&draft),
            None => println!("No detector matched"),
        }
        return;
    }

    let Some(snapshot_path) = matches.get_one::<String>("snapshot") else {
        eprintln!("Nothing to do: pass --snapshot FILE to print a view, or --check-comment TEXT");
        process::exit(2);
    };

    let source = match SnapshotSource::from_file(snapshot_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error loading snapshot: {e}");
            process::exit(1);
        }
    };
    let titles = ArticleTitles::new(source.articles().clone(), &config.title_cache);
    let service = ModerationService::new(source, titles);

    let params = query_params(&matches);
    let view = matches
        .get_one::<String>("view")
        .map(String::as_str)
        .unwrap_or("queue");
    let now = Utc::now();

    let result = match view {
        "activity" => ActivityQuery::from_params(&params)
            .map(|query| service.activity(&query, now).map(|feed| to_json(&feed))),
        "metrics" => MetricsQuery::from_params(&params)
            .map(|query| service.metrics(&query, now).map(|summary| to_json(&summary))),
        _ => QueueQuery::from_params(&params)
            .map(|query| service.queue(&query, now).map(|page| to_json(&page))),
    };

    match result {
        Ok(Ok(Ok(json))) => println!("{json}"),
        Ok(Ok(Err(e))) => {
            eprintln!("Error serializing {view}: {e}");
            process::exit(1);
        }
        Ok(Err(e)) => {
            eprintln!("{e}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Invalid query: {e}");
            process::exit(2);
        }
    }
}

fn load_config(path: &str) -> anyhow::Result<Option<EngineConfig>> {
    if std::path::Path::new(path).exists() {
        EngineConfig::from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

fn generate_default_config(path: &str) {
    let config = EngineConfig::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn query_params(matches: &ArgMatches) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = QUERY_PARAMS
        .iter()
        .filter_map(|(arg, key)| {
            matches
                .get_one::<String>(arg)
                .map(|value| (key.to_string(), value.clone()))
        })
        .collect();
    if matches.get_flag("include-resolved") {
        params.insert("includeResolved".to_string(), "true".to_string());
    }
    params
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn print_json<T: Serialize>(value: &T) {
    match to_json(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            process::exit(1);
        }
    }
}
