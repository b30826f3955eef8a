use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Quire Contributors")
        .about("Archive newsletter publications to HTML and plain text")
        .arg(
            clap::arg!(-c --config <FILE> "Publication list (JSON)")
                .default_value("config.json")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-o --output_dir <DIR> "Output directory for entries that do not set their own")
                .default_value("./archive")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--storage_state <FILE> "Stored browser session (Playwright storage-state JSON)")
                .default_value("storage_state.json")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--email <EMAIL> "Login email, used when no stored session exists"))
        .arg(clap::arg!(--password <PASSWORD> "Login password, used when no stored session exists"))
        .arg(clap::arg!(--require_login "Skip a publication when login fails instead of continuing anonymously"))
        .arg(
            clap::arg!(--detail_pages <MODE> "When to fetch post pages for their body")
                .value_parser(["never", "missing", "always"]),
        )
        .arg(clap::arg!(--no_skip_existing "Re-process posts that are already archived"))
        .arg(clap::arg!(--timeout <SECS> "Listing page timeout in seconds").default_value("30"))
        .arg(clap::arg!(--detail_timeout <SECS> "Post page timeout in seconds").default_value("90"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--list "Print the resolved publications and exit"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--log_file <PATH> "Also write debug logs to this file")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "quire", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
