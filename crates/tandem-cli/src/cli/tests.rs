#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use crate::config::Overrides;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_cli_verbose_quiet_conflict() {
        let result = Cli::try_parse_from(["tandem", "--verbose", "--quiet", "dev"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Cli::try_parse_from(["tandem", "dev", "-v", "--no-color"]).unwrap();
        assert!(args.verbose);
        assert!(args.no_color);
    }

    #[test]
    fn test_dev_args_defaults() {
        let args = Cli::try_parse_from(["tandem", "dev"]).unwrap();

        if let Command::Dev(dev) = args.command {
            assert!(dev.config.is_none());
            assert!(dev.cwd.is_none());
            assert!(dev.client_port.is_none());
            assert!(dev.server_port.is_none());
            assert!(!dev.no_server);
            assert!(!dev.hot_loader);
            assert_eq!(Overrides::from(&dev), Overrides::default());
        } else {
            panic!("Expected Dev command");
        }
    }

    #[test]
    fn test_dev_args_overrides() {
        let args = Cli::try_parse_from([
            "tandem",
            "dev",
            "--config",
            "conf/tandem.json",
            "--client-port",
            "4001",
            "--server-port",
            "4000",
            "--no-server",
            "--hot-loader",
        ])
        .unwrap();

        let Command::Dev(dev) = args.command else {
            panic!("Expected Dev command");
        };
        assert_eq!(dev.config, Some(PathBuf::from("conf/tandem.json")));
        assert_eq!(
            Overrides::from(&dev),
            Overrides {
                client_port: Some(4001),
                server_port: Some(4000),
                no_server: true,
                hot_loader: true,
            }
        );
    }

    #[test]
    fn test_dev_args_reject_bad_port() {
        assert!(Cli::try_parse_from(["tandem", "dev", "--client-port", "70000"]).is_err());
    }

    #[test]
    fn test_check_args() {
        let args = Cli::try_parse_from(["tandem", "check", "--schema"]).unwrap();
        let Command::Check(check) = args.command else {
            panic!("Expected Check command");
        };
        assert!(check.schema);
        assert!(!check.example);

        let result = Cli::try_parse_from(["tandem", "check", "--schema", "--example"]);
        assert!(result.is_err());
    }
}
