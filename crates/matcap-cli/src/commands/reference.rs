use anyhow::Result;
use matcap_cli::cli::{OutputFormat, ReferenceArgs};
use matcap_io::{configuration_to_string, reference_configuration, save_configuration, ConfigFormat};

pub fn handle(args: &ReferenceArgs) -> Result<()> {
    let config = reference_configuration();
    match &args.out {
        Some(path) => {
            save_configuration(path, &config)?;
            println!("Reference configuration written to {}", path.display());
        }
        None => {
            let format = match args.format {
                OutputFormat::Yaml => ConfigFormat::Yaml,
                OutputFormat::Json => ConfigFormat::Json,
                OutputFormat::Toml => ConfigFormat::Toml,
            };
            print!("{}", configuration_to_string(&config, format)?);
        }
    }
    Ok(())
}
