//! CLI Adapter.

mod create;
mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::api::{
    self, ArchiveFormat, BuildOptions, PackOptions, PreviewOptions, ServeOptions, ServerOptions,
    UpdateOptions,
};
use crate::domain::AppError;

#[derive(Parser)]
#[command(name = "vcmplugin")]
#[command(version)]
#[command(
    about = "Create, build, serve, preview and package VC Map plugins",
    long_about = None
)]
struct Cli {
    /// Plugin directory to work in
    #[arg(long, global = true, default_value = ".")]
    context: PathBuf,
    /// Override the plugin name from package.json
    #[arg(short = 'n', long = "plugin-name", global = true)]
    plugin_name: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new plugin
    Create(create::CreateArgs),
    /// Build the plugin into dist/
    Build {
        /// Development build (no minification, inline sourcemaps)
        #[arg(long)]
        development: bool,
        /// Rebuild on changes
        #[arg(long)]
        watch: bool,
    },
    /// Build and package the plugin as an archive in dist/
    #[clap(visible_alias = "bundle")]
    Pack {
        /// Archive format: zip or tar
        #[arg(long, default_value = "zip")]
        format: ArchiveFormat,
    },
    /// Serve the plugin sources inside the map application
    Serve {
        #[command(flatten)]
        server: ServerArgs,
        /// Serve over https
        #[arg(long)]
        https: bool,
    },
    /// Serve a production build inside the map application
    Preview {
        #[command(flatten)]
        server: ServerArgs,
        /// Hosted map application to preview against
        #[arg(long)]
        vcm: Option<String>,
    },
    /// Build a deployable map application including the plugin into dist/
    #[clap(name = "build-staging-app", visible_alias = "buildStagingApp")]
    BuildStagingApp,
    /// Align peer dependencies with a @vcmap/ui release
    Update {
        /// @vcmap/ui version range
        #[arg(long = "mapVersion")]
        map_version: Option<String>,
    },
    /// Install the development plugins of @vcmap/ui
    #[clap(name = "setup-map-ui")]
    SetupMapUi,
}

#[derive(Args)]
struct ServerArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
    /// Application config file or URL
    #[arg(long = "appConfig")]
    app_config: Option<String>,
    /// Basic auth credentials as user:password
    #[arg(long)]
    auth: Option<String>,
    /// Plugin config file
    #[arg(short, long)]
    config: Option<String>,
}

impl From<ServerArgs> for ServerOptions {
    fn from(args: ServerArgs) -> Self {
        ServerOptions {
            port: args.port,
            app_config: args.app_config,
            auth: args.auth,
            config: args.config,
        }
    }
}

/// Entry point for the CLI.
pub fn run() {
    let cli = Cli::parse();
    logging::init();

    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), AppError> {
    let Cli { context, plugin_name, command } = cli;
    match command {
        Commands::Create(args) => create::run_create(&context, args),
        Commands::Build { development, watch } => {
            let outcome = api::build(&context, plugin_name, BuildOptions { development, watch })?;
            println!("✅ Built {} into {}", outcome.plugin_name, outcome.out_dir.display());
            Ok(())
        }
        Commands::Pack { format } => {
            let archive = api::pack(&context, plugin_name, PackOptions { format })?;
            println!("✅ Packaged {}", archive.display());
            Ok(())
        }
        Commands::Serve { server, https } => {
            let options = ServeOptions { server: server.into(), https };
            api::serve(&context, plugin_name, &options)
        }
        Commands::Preview { server, vcm } => {
            let options = PreviewOptions { server: server.into(), vcm };
            api::preview(&context, plugin_name, &options)
        }
        Commands::BuildStagingApp => {
            let dist = api::build_staging_app(&context, plugin_name)?;
            println!("✅ Staging app written to {}", dist.display());
            Ok(())
        }
        Commands::Update { map_version } => {
            let outcome = api::update(&context, plugin_name, &UpdateOptions { map_version })?;
            println!("✅ Updated to @vcmap/ui {}", outcome.host_version);
            for spec in &outcome.installed {
                println!("  • {}", spec);
            }
            Ok(())
        }
        Commands::SetupMapUi => {
            api::setup_map_ui(&context)?;
            println!("✅ Installed @vcmap/ui plugins");
            Ok(())
        }
    }
}
