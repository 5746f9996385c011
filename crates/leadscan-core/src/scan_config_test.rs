use super::*;

fn parse(yaml: &str) -> Result<ScanConfig, ConfigError> {
    let config: ScanConfig = serde_yaml::from_str(yaml)?;
    validate_scan_config(&config)?;
    Ok(config)
}

#[test]
fn minimal_config_gets_defaults() {
    let config = parse("keywords: [automate, workflow]").unwrap();
    assert_eq!(config.keywords, vec!["automate", "workflow"]);
    assert!((config.hot_threshold - 1.5).abs() < f64::EPSILON);
    assert_eq!(config.retention_days, 7);
    assert_eq!(config.per_source_limit, 20);
    assert!(config.filters.exclude_service_offers);
    assert_eq!(config.rate_limit.default_delay_ms, 2_000);
}

#[test]
fn default_tiers_are_ordered_by_score() {
    let config = parse("keywords: [x]").unwrap();
    let scores: Vec<u8> = config.tiers.iter().map(|t| t.score).collect();
    assert_eq!(scores, vec![100, 90, 70, 60, 50]);
    assert_eq!(config.tiers[0].match_mode, MatchMode::Exact);
}

#[test]
fn missing_keywords_is_rejected() {
    let err = parse("hot_threshold: 2.0").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("keyword"));
}

#[test]
fn blank_keywords_are_rejected() {
    let err = parse("keywords: ['  ', '']").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn hot_threshold_must_exceed_one() {
    let err = parse("keywords: [x]\nhot_threshold: 1.0").unwrap_err();
    assert!(err.to_string().contains("hot_threshold"));
}

#[test]
fn tier_score_above_hundred_is_rejected() {
    let yaml = r"
keywords: [x]
tiers:
  - name: silly
    score: 150
    keywords: [foo]
";
    let err = parse(yaml).unwrap_err();
    assert!(err.to_string().contains("silly"));
}

#[test]
fn custom_tiers_replace_defaults() {
    let yaml = r"
keywords: [x]
tiers:
  - name: exact
    score: 100
    match: exact
    keywords: [rust]
  - name: loose
    score: 40
    keywords: [lang]
";
    let config = parse(yaml).unwrap();
    assert_eq!(config.tiers.len(), 2);
    assert_eq!(config.tiers[1].match_mode, MatchMode::Substring);
}

#[test]
fn feed_cannot_be_tagged_as_reddit() {
    let yaml = r"
keywords: [x]
sources:
  rss:
    - name: odd
      url: https://example.com/feed.xml
      source: reddit
";
    let err = parse(yaml).unwrap_err();
    assert!(err.to_string().contains("odd"));
}

#[test]
fn rate_limit_falls_back_to_default_delay() {
    let yaml = r"
keywords: [x]
rate_limit:
  default_delay_ms: 500
  per_source:
    reddit: 3000
";
    let config = parse(yaml).unwrap();
    assert_eq!(
        config.rate_limit.delay_for(Source::Reddit),
        Duration::from_millis(3_000)
    );
    assert_eq!(
        config.rate_limit.delay_for(Source::Github),
        Duration::from_millis(500)
    );
}

#[test]
fn monitored_matches_names_loosely() {
    let yaml = r"
keywords: [x]
monitored:
  - source: reddit
    name: Entrepreneur
  - source: youtube
";
    let config = parse(yaml).unwrap();
    assert!(config.is_monitored(Source::Reddit, "r/entrepreneur"));
    assert!(!config.is_monitored(Source::Reddit, "smallbusiness"));
    assert!(config.is_monitored(Source::Youtube, "Any Channel"));
    assert!(!config.is_monitored(Source::Twitter, "entrepreneur"));
}

#[test]
fn sources_section_parses() {
    let yaml = r"
keywords: [x]
sources:
  reddit:
    subreddits: [entrepreneur, smallbusiness]
  youtube:
    - name: Fireship
      channel_id: UCsBjURrPoezykLs9EqgamOA
  moltbook: {}
";
    let config = parse(yaml).unwrap();
    let reddit = config.sources.reddit.unwrap();
    assert_eq!(reddit.sort, "new");
    assert_eq!(reddit.limit, 25);
    assert_eq!(config.sources.youtube.len(), 1);
    assert_eq!(config.sources.moltbook.unwrap().limit, 50);
    assert!(config.sources.github.is_none());
}

#[test]
fn load_scan_config_reports_missing_file() {
    let err = load_scan_config(Path::new("/nonexistent/leadscan/scan.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ScanFileIo { .. }));
}

#[test]
fn bundled_sample_config_is_valid() {
    let config = parse(include_str!("../../../config/scan.yaml")).unwrap();
    assert!(!config.keywords.is_empty());
    assert_eq!(config.filters.min_keyword_matches, 1);
    assert_eq!(config.rate_limit.delay_for(Source::Github).as_millis(), 1_000);
    let health: Vec<_> = config
        .sources
        .rss
        .iter()
        .filter(|f| f.source == Some(Source::Health))
        .collect();
    assert_eq!(health.len(), 1);
    assert!(config.is_monitored(Source::Github, "any/repo"));
}

#[test]
fn retention_days_is_bounded() {
    let err = parse("keywords: [x]\nretention_days: 4294967295").unwrap_err();
    assert!(err.to_string().contains("retention_days"));
    let config = parse("keywords: [x]\nretention_days: 36500").unwrap();
    assert_eq!(config.retention_days, MAX_RETENTION_DAYS);
}
