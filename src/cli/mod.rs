mod catalog;
mod engine;
mod serve;

use anyhow::Result;
use console::style;

use crate::core::settings::HubSettings;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::platform::{NativePlatform, Platform};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Server")
        .command("serve", "Start the dashboard (default)")
        .command("status", "Check the engine and stored credential")
        .print();

    GuideSection::new("Catalog")
        .command("templates", "List workflow templates [--category <name>]")
        .command(
            "connectors",
            "List connectors [--category <name>] [--search <term>]",
        )
        .command("deploy <template-id>", "Create a template's workflow on the engine")
        .print();

    GuideSection::new("Configuration")
        .command("config show", "Show the stored configuration")
        .command("config set-key <key>", "Store the engine API key")
        .print();

    GuideSection::new("Serve flags")
        .text("--host <addr>            Listen address (default: 127.0.0.1)")
        .text("--port <port>            Listen port (default: 3000)")
        .text("--engine-url <url>       Engine base URL (default: http://localhost:5678)")
        .text("--open                   Open the dashboard in a browser")
        .print();

    println!(
        "\n {} {} <command> [options]\n",
        style("Usage:").bold(),
        style("workflow-hub").green()
    );
}

/// Value following `name` at or after `start`, if any.
pub(crate) fn flag_value(args: &[String], start: usize, name: &str) -> Option<String> {
    let pos = args.iter().skip(start).position(|a| a == name)?;
    args.get(start + pos + 1).cloned()
}

fn load_settings(args: &[String], flags_start: usize) -> Result<HubSettings> {
    let mut settings = HubSettings::load(&NativePlatform::data_dir())?;
    settings.apply_flags(args, flags_start);
    settings.validate()?;
    Ok(settings)
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let data_dir = NativePlatform::data_dir();
    let cmd = args.get(1).map(String::as_str).unwrap_or("serve");

    match cmd {
        "serve" => {
            let settings = load_settings(&args, 2)?;
            serve::run_serve(settings, data_dir).await
        }
        flag if flag.starts_with("--") && flag != "--help" && flag != "--version" => {
            let settings = load_settings(&args, 1)?;
            serve::run_serve(settings, data_dir).await
        }
        "status" => {
            let settings = load_settings(&args, 2)?;
            engine::run_status(&settings, &data_dir).await
        }
        "templates" => catalog::run_templates(flag_value(&args, 2, "--category").as_deref()),
        "connectors" => catalog::run_connectors(
            flag_value(&args, 2, "--category").as_deref(),
            flag_value(&args, 2, "--search").as_deref(),
        ),
        "deploy" => {
            let Some(template_id) = args.get(2).filter(|a| !a.starts_with("--")) else {
                print_error("Missing template id. Usage: workflow-hub deploy <template-id>");
                return Ok(());
            };
            let settings = load_settings(&args, 3)?;
            engine::run_deploy(&settings, &data_dir, template_id).await
        }
        "config" => {
            let sub_cmd = args.get(2).map(String::as_str).unwrap_or("show");
            match sub_cmd {
                "show" => engine::run_config_show(&data_dir),
                "set-key" => match args.get(3) {
                    Some(key) if !key.trim().is_empty() => {
                        engine::run_config_set_key(&data_dir, key)
                    }
                    _ => {
                        print_error("Missing key. Usage: workflow-hub config set-key <key>");
                        Ok(())
                    }
                },
                _ => {
                    print_error("Unknown config command. Expected: show, set-key");
                    Ok(())
                }
            }
        }
        "--version" | "-V" | "version" => {
            println!("workflow-hub {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            print_error(&format!("Unknown command '{}'", other));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_value_reads_following_arg() {
        let a = args(&["workflow-hub", "connectors", "--search", "sheet", "--category"]);
        assert_eq!(flag_value(&a, 2, "--search").as_deref(), Some("sheet"));
        assert_eq!(flag_value(&a, 2, "--category"), None);
        assert_eq!(flag_value(&a, 2, "--missing"), None);
    }
}
