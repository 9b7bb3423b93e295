//! kubeadm CLI
//!
//! Binary name: `kubeadm`

use std::process;

use kubeadm::cli::{
    build_root_command, format_error, get_exit_code, run_cli, setup::init_tracing, LeafFactories,
    Output,
};
use kubeadm_core::config::load_settings;

fn main() {
    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {e}");
            }
            #[allow(clippy::exit)]
            process::exit(e.exit_code());
        }
    };

    if let Err(e) = init_tracing(&settings.log_level) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Warning: {e}");
        }
    }

    let out = Output::stdout();
    let err = Output::stderr();
    let root = build_root_command(&LeafFactories::standard(&settings), &out, &err);

    if let Err(e) = run_cli(&root, std::env::args_os()) {
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            let _ = clap_err.print();
            #[allow(clippy::exit)]
            process::exit(clap_err.exit_code());
        }

        tracing::debug!(error = ?e, "command failed");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {}", format_error(&e));
        }
        #[allow(clippy::exit)]
        process::exit(get_exit_code(&e));
    }
}
