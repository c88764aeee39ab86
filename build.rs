// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("splitinstall")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Install APK, XAPK, APKS and APKM packages on an Android device")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Config file (default: ~/.config/splitinstall/config.toml)"),
        )
        .arg(
            Arg::new("storage_root")
                .long("storage-root")
                .value_name("PATH")
                .global(true)
                .help("Device storage root; expansion files go under <root>/Android/obb"),
        )
        .arg(
            Arg::new("cache_dir")
                .long("cache-dir")
                .value_name("PATH")
                .global(true)
                .help("Directory for copied sources and extraction"),
        )
        .arg(
            Arg::new("serial")
                .short('s')
                .long("serial")
                .global(true)
                .help("Target device serial (adb -s)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("install")
                .about("Install a package file")
                .arg(
                    Arg::new("source")
                        .required(true)
                        .help("Path or URI of the .apk, .xapk, .apks or .apkm file"),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Do not show a progress spinner"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show what installing a package would do, without installing")
                .arg(Arg::new("path").required(true).help("Path to the package file")),
        )
        .subcommand(
            Command::new("detect")
                .about("Print the container kind of each file name")
                .arg(
                    Arg::new("names")
                        .required(true)
                        .num_args(1..)
                        .help("File names or paths"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell to generate completions for"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("splitinstall.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
