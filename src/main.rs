use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

mod dashboard;
mod diagnostics;
mod resource;
mod template;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "azmon-dashboards")]
#[command(about = "Generate Grafana dashboards for Azure Monitor resources", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Specialize a dashboard template for a list of resources.
    Generate {
        /// Dashboard template (JSON).
        #[arg(long)]
        template: String,

        /// Resource list (JSON array of ARM resource ids or {id, name} objects).
        #[arg(long)]
        resources: String,

        #[arg(long, env = "AZMON_DASHBOARD_TITLE")]
        title: String,

        /// Grafana data source name set on every panel.
        #[arg(long, env = "AZMON_DATASOURCE")]
        datasource: String,

        /// Upper bound on targets generated per panel.
        #[arg(long, env = "AZMON_MAX_RESOURCES", default_value_t = 10)]
        max_resources: usize,

        /// Sub-resource ARM does not track separately, e.g. "default" for blobServices.
        #[arg(long, default_value = "")]
        sub_resource: String,

        /// Output file; stdout when omitted.
        #[arg(short = 'o', long)]
        out: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init_logging(if cli.verbose { "debug" } else { "info" });

    match cli.cmd {
        Commands::Generate {
            template,
            resources,
            title,
            datasource,
            max_resources,
            sub_resource,
            out,
        } => {
            // 1) Load template + resource list.
            let mut tree = template::TemplateTree::load(&template)?;
            let resources = resource::load_resources(&resources)?;
            info!("loaded template {} and {} resources", template, resources.len());

            // 2) Specialize. Any error aborts before anything is written.
            let params = dashboard::SpecializeParams {
                title,
                data_source_name: datasource,
                max_resources,
                sub_resource_name: sub_resource,
            };
            let summary = dashboard::update(&mut tree, &params, &resources).with_context(|| {
                diagnostics::error_message(format!("specialize template {}", template))
            })?;
            info!(
                "specialized {} panels across {} rows ({} fanned out, {} targets)",
                summary.panels, summary.rows, summary.panels_fanned_out, summary.targets_generated
            );

            // 3) Write.
            match out {
                Some(out) => {
                    tree.write(&out)?;
                    info!("wrote {}", out);
                }
                None => print!("{}", tree.to_pretty_json()?),
            }
        }
    }

    Ok(())
}
