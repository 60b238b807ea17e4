//! # MetalLB Operator
//!
//! Installs MetalLB into a cluster and manages its address pools.
//!
//! - `Metallb` resources trigger installation of the MetalLB controller and
//!   speaker from the manifest templates.
//! - `AddressPool` resources are added to MetalLB's configuration ConfigMap.
//!
//! Settings come from environment variables; see
//! [`metallb_operator::config::ControllerConfig`].

use clap::{Parser, Subcommand};
use metallb_operator::config::ControllerConfig;
use metallb_operator::crd::crd_manifests;
use metallb_operator::runtime;

#[derive(Parser)]
#[command(name = "metallb-operator", version)]
#[command(about = "Kubernetes operator that installs MetalLB and manages its address pools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the operator (default)
    Run,
    /// Print CRD manifests to stdout
    Crds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Crds => {
            print!("{}", crd_manifests()?);
            Ok(())
        }
        Commands::Run => runtime::run(ControllerConfig::from_env()).await,
    }
}
