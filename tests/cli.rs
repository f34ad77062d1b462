use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn scraper(workdir: &Path) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("malay_news_scraper")?;
    cmd.current_dir(workdir)
        .env("NO_COLOR", "1")
        .env_remove("MALAY_NEWS_CONFIG")
        .env_remove("MALAY_NEWS_LOG_FILE")
        .arg("--log-file")
        .arg(workdir.join("run.log"));
    Ok(cmd)
}

const SMALL_RANGE: &str = r#"
id_sources:
  - name: Contoh
    base_url: https://example.com
    id_param: p
    id_range: [1, 11]
    sample_size: 5
    title_rules: ["h1"]
"#;

#[test]
fn ids_rejects_oversized_sample_before_any_request() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("scraper.yaml");
    fs::write(&config, SMALL_RANGE)?;

    scraper(dir.path())?
        .arg("--config")
        .arg(&config)
        .args(["ids", "--sample-size", "50", "--output-dir"])
        .arg(dir.path().join("news_id"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds id_range width 10"));

    assert!(!dir.path().join("news_id").exists());
    Ok(())
}

#[test]
fn invalid_config_file_fails_fast() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("broken.yaml");
    fs::write(&config, "id_sources: [ {name: ")?;

    scraper(dir.path())?
        .arg("--config")
        .arg(&config)
        .arg("feeds")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid YAML"));
    Ok(())
}

#[test]
fn merge_concatenates_csv_runs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("scraper");
    fs::create_dir_all(root.join("news_feed"))?;
    fs::create_dir_all(root.join("news_id"))?;

    let header = "News_Source,Title,Source_URL,Publish_Date,Category,Summary,Scrape_Date\n";
    fs::write(
        root.join("news_feed").join("malay_news_2025-03-14.csv"),
        format!("\u{feff}{header}Kosmo,Hujan lebat,https://www.kosmo.com.my/1,,Cuaca,Hujan.,2025-03-14\n"),
    )?;
    fs::write(
        root.join("news_id").join("malay_news_2025-03-14_0830.csv"),
        format!("\u{feff}{header}Utusan Malaysia,Banjir,https://www.utusan.com.my/?p=1,,,Air naik.,2025-03-14\n"),
    )?;

    let out = dir.path().join("data");
    scraper(dir.path())?
        .arg("merge")
        .arg("--root")
        .arg(&root)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let merged = fs::read_to_string(out.join("malay_news.csv"))?;
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(lines.len(), 3, "merged=\n{merged}");
    assert_eq!(lines[0], header.trim_end());
    assert!(lines[1].starts_with("Kosmo,Hujan lebat"));
    assert!(lines[2].starts_with("Utusan Malaysia,Banjir"));
    assert!(!out.join("malay_news.parquet").exists());
    Ok(())
}

#[test]
fn join_training_writes_all_examples() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("ordinal.json"), r#"[{"text": "pertama"}, {"text": "kedua"}]"#)?;
    fs::write(dir.path().join("norp.json"), r#"[{"text": "orang Iban"}]"#)?;

    scraper(dir.path())?
        .args(["join-training", "--seed", "3", "-o", "training_data.json", "ordinal.json", "norp.json"])
        .assert()
        .success();

    let written: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("training_data.json"))?)?;
    assert_eq!(written.len(), 3);
    Ok(())
}
