//! CLI command handlers

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader, paths};
use crate::kube::{FileSnapshotSource, KubeSnapshotSource, SnapshotSource, save_snapshot};
use crate::models::ClusterSnapshot;
use crate::report::ReportWriter;
use crate::topology::{self, Analysis, ComponentResolver, NamespaceClassifier, network};

/// Options of the `analyze` command
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Read a saved snapshot instead of listing a live cluster
    #[arg(long, short = 's')]
    pub snapshot: Option<PathBuf>,

    /// Kubeconfig context to use for a live cluster
    #[arg(long)]
    pub context: Option<String>,

    /// Network flow export (CSV) to derive component edges from
    #[arg(long, short = 'n')]
    pub network_csv: Option<PathBuf>,

    /// Groups to exclude (comma separated); replaces the configured list
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Output directory for reports
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Replace report files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Include pods that are not Running
    #[arg(long)]
    pub all_pods: bool,
}

impl AnalyzeArgs {
    /// Apply per-run flag overrides to the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(exclude) = &self.exclude {
            config.excluded_groups = exclude
                .iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.display().to_string();
        }
        if self.overwrite {
            config.overwrite_reports = true;
        }
        if self.all_pods {
            config.running_pods_only = false;
        }
    }
}

/// Options of the `snapshot` command
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// File to write; `.json` is written as JSON, anything else as YAML
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Include pods that are not Running
    #[arg(long)]
    pub all_pods: bool,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "outputDir", "excludedGroups")
        key: Option<String>,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "outputDir", "excludedGroups")
        key: String,
        /// Configuration value
        value: String,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
    /// Show the effective namespace → group table
    Groups,
}

/// Resolver configured from the loaded configuration
pub fn resolver_for(config: &Config, snapshot: &ClusterSnapshot) -> ComponentResolver {
    ComponentResolver::new(
        NamespaceClassifier::from_config(config),
        &snapshot.replica_sets,
    )
    .with_excluded_groups(config.excluded_groups.iter().cloned())
    .with_host_mount_ignore_prefixes(config.host_mount_ignore_prefixes.clone())
}

/// Groups that get a diagram: every configured group plus the default one, minus exclusions
pub fn diagram_groups(config: &Config) -> Vec<String> {
    let mut groups: Vec<String> = config.namespace_groups.keys().cloned().collect();
    if !groups.contains(&config.default_group) {
        groups.push(config.default_group.clone());
        groups.sort();
    }
    groups.retain(|g| !config.excluded_groups.contains(g));
    groups
}

/// Fetch a snapshot, read the optional flow export and build the graph
pub async fn run_analysis(
    source: &dyn SnapshotSource,
    network_csv: Option<&Path>,
    config: &Config,
) -> Result<Analysis> {
    let snapshot = source
        .fetch()
        .await
        .context("Failed to fetch cluster snapshot")?;

    let flows = match network_csv {
        Some(path) => Some(
            network::read_flows_from_path(path)
                .with_context(|| format!("Failed to read network flows from {}", path.display()))?,
        ),
        None => None,
    };

    let resolver = resolver_for(config, &snapshot);
    let analysis = topology::analyze(&snapshot, flows.as_deref(), &resolver)
        .context("Failed to build component graph")?;
    Ok(analysis)
}

async fn live_source(context: Option<&str>, running_pods_only: bool) -> Result<KubeSnapshotSource> {
    let client = crate::kube::create_client(context)
        .await
        .context("Failed to connect to Kubernetes cluster")?;
    Ok(KubeSnapshotSource::new(client).with_running_pods_only(running_pods_only))
}

/// Handle `analyze`
pub async fn handle_analyze(args: AnalyzeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    ConfigLoader::check(&config).context("Invalid configuration")?;

    let source: Box<dyn SnapshotSource> = match &args.snapshot {
        Some(path) => Box::new(FileSnapshotSource::new(path)),
        None => Box::new(live_source(args.context.as_deref(), config.running_pods_only).await?),
    };

    let analysis = run_analysis(source.as_ref(), args.network_csv.as_deref(), &config).await?;

    let writer = ReportWriter::new(&config.output_dir).with_overwrite(config.overwrite_reports);
    let summary = writer
        .write_all(&analysis.graph, &diagram_groups(&config))
        .context("Failed to write reports")?;

    println!(
        "{} components, {} edges",
        analysis.graph.len(),
        analysis.graph.edge_count()
    );
    if let Some(correlation) = analysis.correlation {
        println!(
            "{} flows: {} edges added, {} dropped",
            correlation.flows, correlation.edges_added, correlation.dropped
        );
    }
    println!(
        "Reports in {}: {} written, {} skipped",
        writer.output_dir().display(),
        summary.written,
        summary.skipped
    );
    Ok(())
}

/// Handle `snapshot`
pub async fn handle_snapshot(args: SnapshotArgs, config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    let running_only = config.running_pods_only && !args.all_pods;

    let source = live_source(args.context.as_deref(), running_only).await?;
    let snapshot = source.fetch().await.context("Failed to fetch cluster snapshot")?;
    save_snapshot(&snapshot, &args.output).await?;

    println!("Saved {} to {}", snapshot.summary(), args.output.display());
    Ok(())
}

/// Handle configuration subcommands
pub async fn handle_config_command(cmd: ConfigSubcommand, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;

            if let Some(key) = key {
                let value = crate::config::get_config_value(&config, &key)?;
                println!("{}", value);
            } else {
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set { key, value } => {
            let target = ConfigLoader::target_path(config_path);
            let mut config = if target.exists() {
                ConfigLoader::load_file(&target)?
            } else {
                ConfigLoader::load_defaults()
            };

            crate::config::set_config_value(&mut config, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            ConfigLoader::save(&config, &target).context("Failed to save configuration")?;
            println!("Configuration saved to {}", target.display());
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(paths::root_config_path);
            println!("{}", path.display());
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(config_path) {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
        ConfigSubcommand::Groups => {
            let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
            for (group, namespaces) in &config.namespace_groups {
                let marker = if config.excluded_groups.contains(group) {
                    " (excluded)"
                } else {
                    ""
                };
                println!("{}{}:", group, marker);
                for ns in namespaces {
                    println!("  - {}", ns);
                }
            }
            println!("Unlisted namespaces: {}", config.default_group);
        }
    }

    Ok(())
}
