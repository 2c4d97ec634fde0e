//! Integration tests for Freezer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Port 9 (discard) is closed on test hosts, so any request fails fast
    const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";

    fn freezer(home: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("freezer");
        cmd.env("HOME", home)
            .env("FREEZER_CONFIG", home.join("absent-config.toml"))
            .env_remove("GITHUB_TOKEN");
        cmd
    }

    fn seed_cache(cache: &Path) -> std::path::PathBuf {
        let published = cache.join("cloudfoundry").join("nodejs-cnb").join("1.2.3");
        std::fs::create_dir_all(&published).unwrap();
        std::fs::write(published.join("buildpack.toml"), "api = \"0.2\"").unwrap();

        let index = serde_json::json!({
            "cloudfoundry:nodejs-cnb": {
                "version": "1.2.3",
                "uri": published,
                "asset": "nodejs-cnb-1.2.3.tgz",
                "sha256": "",
                "fetched_at": "2024-01-01T00:00:00Z"
            }
        });
        std::fs::write(cache.join("buildpacks-cache.db"), index.to_string()).unwrap();
        published
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("buildpack"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("freezer"));
    }

    #[test]
    fn stock_help_lists_flags() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["stock", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--org"))
            .stdout(predicate::str::contains("--cache-directory"))
            .stdout(predicate::str::contains("--github-token"));
    }

    #[test]
    fn stock_without_org_fails() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["stock", "--repo", "nodejs-cnb", "--github-token", "t"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing required flag --org"));
    }

    #[test]
    fn stock_without_token_fails_cleanly() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["stock", "--org", "cloudfoundry", "--repo", "nodejs-cnb"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No GitHub token"))
            .stderr(predicate::str::contains("panicked").not());

        // Nothing is created before configuration is complete
        assert!(!home.path().join(".freezer-cache").exists());
    }

    #[test]
    fn stock_rejects_bad_endpoint() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args([
                "stock",
                "--org",
                "cloudfoundry",
                "--repo",
                "nodejs-cnb",
                "--github-token",
                "t",
                "--git-endpoint",
                "ftp://example.com",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--git-endpoint"));
    }

    #[test]
    fn stock_serves_cached_buildpack_without_network() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        let published = seed_cache(&cache);

        freezer(home.path())
            .args(["stock", "--org", "cloudfoundry", "--repo", "nodejs-cnb"])
            .arg("--cache-directory")
            .arg(&cache)
            .args(["--git-endpoint", UNREACHABLE_ENDPOINT])
            .env("GITHUB_TOKEN", "from-env")
            .assert()
            .success()
            .stdout(predicate::str::contains(published.to_string_lossy().to_string()));
    }

    #[test]
    fn stock_reports_unreachable_endpoint() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");

        freezer(home.path())
            .args(["stock", "--org", "cloudfoundry", "--repo", "nodejs-cnb"])
            .arg("--cache-directory")
            .arg(&cache)
            .args(["--git-endpoint", UNREACHABLE_ENDPOINT, "--github-token", "t"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));

        assert!(!cache.join("cloudfoundry").join("nodejs-cnb").exists());
    }

    #[test]
    fn cache_list_empty() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["cache", "list", "--cache-directory"])
            .arg(home.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached buildpacks"));
    }

    #[test]
    fn cache_list_json_shows_entry() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        seed_cache(&cache);

        freezer(home.path())
            .args(["cache", "list", "--format", "json", "--cache-directory"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("cloudfoundry/nodejs-cnb"))
            .stdout(predicate::str::contains("1.2.3"));
    }

    #[test]
    fn cache_clear_removes_entries() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        let published = seed_cache(&cache);

        freezer(home.path())
            .args(["cache", "clear", "--yes", "--cache-directory"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared 1"));

        assert!(!published.exists());
        assert!(!cache.join("buildpacks-cache.db").exists());
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("absent-config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        freezer(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn settings_file_supplies_cache_directory() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("configured-cache");
        let published = seed_cache(&cache);
        let settings = home.path().join("freezer.toml");
        std::fs::write(
            &settings,
            format!(
                "[stock]\ncache_directory = {:?}\ngit_endpoint = {:?}\n",
                cache.to_string_lossy(),
                UNREACHABLE_ENDPOINT
            ),
        )
        .unwrap();

        freezer(home.path())
            .env("FREEZER_CONFIG", &settings)
            .args(["stock", "--org", "cloudfoundry", "--repo", "nodejs-cnb"])
            .args(["--github-token", "t"])
            .assert()
            .success()
            .stdout(predicate::str::contains(published.to_string_lossy().to_string()));
    }

    #[test]
    fn invalid_settings_file_is_reported() {
        let home = TempDir::new().unwrap();
        let settings = home.path().join("freezer.toml");
        std::fs::write(&settings, "[stock\n").unwrap();

        freezer(home.path())
            .env("FREEZER_CONFIG", &settings)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid settings file"));
    }
}
