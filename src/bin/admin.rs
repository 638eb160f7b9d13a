use std::collections::VecDeque;
use std::time::Duration;

use truecred_dashboard::auth::CredentialValidator;
use truecred_dashboard::domain::DemoSample;
use truecred_dashboard::infra::{CancelToken, FlowRequest};
use truecred_dashboard::{DashboardConfig, DashboardContext};

fn print_help() {
    eprintln!(
        "\
truecred-admin

USAGE:
  truecred-admin <command> [options]

COMMANDS:
  simulate                        Run simulator ticks and print the dashboard snapshot
  verify-demo                     Run a demo verification and print its report
  health                          Sample component health once
  check-credentials               Validate an email/password pair

COMMON OPTIONS:
  --seed <n>                      (defaults to env TRUECRED_SEED)

simulate OPTIONS:
  --ticks <n>                     (default: 10)

verify-demo OPTIONS:
  --sample <valid|suspicious|fraudulent>  (required)
  --dwell-ms <n>                  (default: 0) Time spent in each state

check-credentials OPTIONS:
  --email <address>               (required)
  --password <secret>             (required)
"
    );
}

fn take_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn build_context(seed: Option<u64>) -> anyhow::Result<DashboardContext> {
    let mut config = DashboardConfig::from_env()?;
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(DashboardContext::new(config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "simulate" => {
            let mut seed: Option<u64> = None;
            let mut ticks: u64 = 10;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--seed" => seed = Some(take_value(&mut args, "--seed")?.parse()?),
                    "--ticks" => ticks = take_value(&mut args, "--ticks")?.parse()?,
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let context = build_context(seed)?;
            context.seed_feed(chrono::Utc::now());
            for _ in 0..ticks {
                context.simulator.tick();
            }
            println!("{}", serde_json::to_string_pretty(&context.snapshot())?);
            Ok(())
        }
        "verify-demo" => {
            let mut seed: Option<u64> = None;
            let mut sample: Option<DemoSample> = None;
            let mut dwell = Duration::ZERO;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--seed" => seed = Some(take_value(&mut args, "--seed")?.parse()?),
                    "--sample" => {
                        let raw = take_value(&mut args, "--sample")?;
                        sample = Some(raw.parse().map_err(|e: String| anyhow::anyhow!(e))?);
                    }
                    "--dwell-ms" => {
                        dwell = Duration::from_millis(take_value(&mut args, "--dwell-ms")?.parse()?)
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let sample = sample.ok_or_else(|| anyhow::anyhow!("--sample is required"))?;
            let mut config = DashboardConfig::from_env()?;
            if seed.is_some() {
                config.seed = seed;
            }
            config.flow.dwell = dwell;
            config.flow.settle = dwell;
            let context = DashboardContext::new(config)?;

            let report = context
                .flow
                .run(FlowRequest::demo(sample), CancelToken::new())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        "health" => {
            let mut seed: Option<u64> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--seed" => seed = Some(take_value(&mut args, "--seed")?.parse()?),
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let context = build_context(seed)?;
            let report = context.health.sample();
            println!("{}", serde_json::to_string_pretty(&report)?);
            for alert in context.notifications.recent_alerts() {
                eprintln!("warning: {}", alert.message);
            }
            Ok(())
        }
        "check-credentials" => {
            let mut email: Option<String> = None;
            let mut password: Option<String> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--email" => email = Some(take_value(&mut args, "--email")?),
                    "--password" => password = Some(take_value(&mut args, "--password")?),
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let email = email.ok_or_else(|| anyhow::anyhow!("--email is required"))?;
            let password = password.ok_or_else(|| anyhow::anyhow!("--password is required"))?;

            match CredentialValidator::new().validate_credentials(&email, &password) {
                Ok(()) => {
                    println!("ok: credentials are well-formed");
                    Ok(())
                }
                Err(e) => anyhow::bail!("{}", e.user_message()),
            }
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
