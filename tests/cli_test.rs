//! CLI Command Tests
//!
//! Argument parsing, plus runs of the real binary against a seeded data
//! directory. Covers JSON output format and exit codes.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use homevideo::cli::{Cli, Command, ExitCode as CliExitCode, PickMode};

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["homevideo"]).is_err());
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::parse_from(["homevideo", "ls", "--filter", "alien", "-l", "3"]);
        match cli.command {
            Command::Titles(cmd) => {
                assert_eq!(cmd.filter.as_deref(), Some("alien"));
                assert_eq!(cmd.limit, Some(3));
            }
            _ => panic!("Expected Titles command"),
        }

        let cli = Cli::parse_from(["homevideo", "d", "--list"]);
        assert!(matches!(cli.command, Command::Discover(cmd) if cmd.list));
    }

    #[test]
    fn test_pick_modes() {
        for (arg, mode) in [
            ("stream", PickMode::Stream),
            ("download", PickMode::Download),
            ("cast", PickMode::Cast),
        ] {
            let cli = Cli::parse_from(["homevideo", "pick", "matrix", "-m", arg]);
            match cli.command {
                Command::Pick(cmd) => assert_eq!(cmd.mode, mode),
                _ => panic!("Expected Pick command"),
            }
        }

        assert!(Cli::try_parse_from(["homevideo", "pick", "matrix", "-m", "burn"]).is_err());
    }

    #[test]
    fn test_pick_requires_id() {
        assert!(Cli::try_parse_from(["homevideo", "pick"]).is_err());
    }

    #[test]
    fn test_sync_force() {
        let cli = Cli::parse_from(["homevideo", "sync", "--force"]);
        assert!(matches!(cli.command, Command::Sync(cmd) if cmd.force));
    }

    #[test]
    fn test_update_defaults() {
        let cli = Cli::parse_from(["homevideo", "update", "--current", "12"]);
        match cli.command {
            Command::Update(cmd) => {
                assert_eq!(cmd.current, 12);
                assert_eq!(cmd.package, "com.hudren.homevideo");
            }
            _ => panic!("Expected Update command"),
        }
    }

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(CliExitCode::Error), 1);
        assert_eq!(i32::from(CliExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(CliExitCode::NotFound), 7);
    }
}

// =============================================================================
// Binary Tests
// =============================================================================

mod cli_binary {
    use std::path::Path;
    use std::process::{Command, Output};

    use homevideo::config::Config;
    use homevideo::{ClientStore, FileStore, ServerRecord};
    use serde_json::Value;

    const CATALOG: &str = r#"[
        {
            "id": "matrix",
            "title": "The Matrix",
            "sorting": "Matrix, The",
            "info": {"year": 1999, "plot": "A hacker learns the truth."},
            "videos": [{
                "title": "The Matrix",
                "duration": 8160.0,
                "containers": [
                    {"filename": "matrix-4k.mkv", "mimetype": "video/x-matroska", "width": 3840,
                     "bitrate": 40000000, "size": 9000000000, "video": "HEVC", "audio": "DTS",
                     "url": "http://192.168.1.5:8090/matrix-4k.mkv"},
                    {"filename": "matrix.mp4", "mimetype": "video/mp4", "width": 1920,
                     "bitrate": 8000000, "size": 2000000000, "video": "H.264", "audio": "AAC",
                     "url": "http://192.168.1.5:8090/matrix.mp4"},
                    {"filename": "matrix-720.mp4", "mimetype": "video/mp4", "width": 1280,
                     "bitrate": 4000000, "size": 1000000000, "video": "H.264", "audio": "AAC",
                     "url": "http://192.168.1.5:8090/matrix-720.mp4"}
                ]
            }]
        },
        {
            "id": "alien",
            "title": "Alien",
            "videos": [{
                "title": "Alien",
                "containers": [
                    {"filename": "alien.mkv", "mimetype": "video/x-matroska", "width": 3840,
                     "bitrate": 60000000, "size": 9000000000, "video": "HEVC",
                     "url": "http://192.168.1.5:8090/alien.mkv"}
                ]
            }]
        }
    ]"#;

    /// Config file plus data directory with a bound server and cached catalog
    fn seeded(dir: &Path) -> std::path::PathBuf {
        let data = dir.join("data");
        let store = FileStore::new(&data);
        store
            .save_record(&ServerRecord {
                network: Some("home".to_string()),
                name: Some("nas".to_string()),
                url: Some("http://192.168.1.5:8090".to_string()),
                etag: Some("\"v1\"".to_string()),
                update_version: 0,
            })
            .unwrap();
        store.save_catalog(CATALOG.as_bytes()).unwrap();

        let config = Config {
            data_dir: Some(data),
            network_name: Some("home".to_string()),
            ..Config::default()
        };
        let path = dir.join("config.toml");
        config.save_to(&path).unwrap();
        path
    }

    fn run(config: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_homevideo"))
            .arg("--json")
            .arg("--config")
            .arg(config)
            .args(args)
            .env("RUST_LOG", "off")
            .output()
            .unwrap()
    }

    fn data(output: &Output) -> Value {
        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        json["data"].clone()
    }

    #[test]
    fn test_titles_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let output = run(&config, &["titles"]);
        assert_eq!(output.status.code(), Some(0));

        let titles = data(&output);
        assert_eq!(titles[0]["id"], "alien");
        assert_eq!(titles[1]["id"], "matrix");
        assert_eq!(titles[1]["year"], 1999);
    }

    #[test]
    fn test_show_missing_title() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let output = run(&config, &["show", "nope"]);
        assert_eq!(output.status.code(), Some(7));

        let json: Value = serde_json::from_slice(&output.stderr).unwrap();
        assert_eq!(json["exit_code"], 7);
    }

    #[test]
    fn test_pick_per_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let stream = run(&config, &["pick", "matrix", "--width", "1280"]);
        assert_eq!(stream.status.code(), Some(0));
        assert_eq!(data(&stream)["filename"], "matrix-720.mp4");

        let highest = run(&config, &["pick", "matrix", "--highest"]);
        assert_eq!(data(&highest)["filename"], "matrix-4k.mkv");

        let cast = run(&config, &["pick", "matrix", "--mode", "cast"]);
        assert_eq!(data(&cast)["filename"], "matrix.mp4");
        assert_eq!(data(&cast)["mode"], "cast");

        let download = run(&config, &["pick", "matrix", "--mode", "download"]);
        assert_eq!(data(&download)["filename"], "matrix-720.mp4");
    }

    #[test]
    fn test_pick_nothing_castable() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let output = run(&config, &["pick", "alien", "--mode", "cast"]);
        assert_eq!(output.status.code(), Some(5));
    }

    #[test]
    fn test_pick_offline_needs_download() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let output = run(&config, &["pick", "matrix", "--offline"]);
        assert_eq!(output.status.code(), Some(5));

        let downloads = dir.path().join("data").join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("matrix-720.mp4"), b"").unwrap();

        let output = run(&config, &["pick", "matrix", "--offline"]);
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(data(&output)["filename"], "matrix-720.mp4");
    }

    #[test]
    fn test_server_and_forget() {
        let dir = tempfile::tempdir().unwrap();
        let config = seeded(dir.path());

        let output = run(&config, &["server"]);
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(data(&output)["name"], "nas");
        assert_eq!(data(&output)["network"], "home");

        let output = run(&config, &["forget"]);
        assert_eq!(output.status.code(), Some(0));

        let output = run(&config, &["titles"]);
        assert_eq!(output.status.code(), Some(7));
    }
}
