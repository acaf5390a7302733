use std::path::PathBuf;

use anyhow::{Context, bail};

use dealerdesk_core::ProductId;

pub const USAGE: &str = "usage: dealerdesk <product-id> <selection.json> [--submit]";

/// Command line of the `dealerdesk` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub product_id: ProductId,
    pub selection_path: PathBuf,
    /// Send the line to the cart after pricing it.
    pub submit: bool,
}

impl CliArgs {
    /// Parse the arguments after the program name.
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut positional = Vec::new();
        let mut submit = false;

        for arg in args {
            match arg.as_str() {
                "--submit" => submit = true,
                flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
                _ => positional.push(arg),
            }
        }

        let [product_id, selection_path] = <[String; 2]>::try_from(positional)
            .map_err(|_| anyhow::anyhow!(USAGE))?;

        Ok(Self {
            product_id: ProductId::new(product_id).context("invalid product id")?,
            selection_path: PathBuf::from(selection_path),
            submit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> anyhow::Result<CliArgs> {
        CliArgs::parse(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_positionals_and_submit_flag() {
        let parsed = args(&["rug-1", "line.json", "--submit"]).unwrap();
        assert_eq!(parsed.product_id.as_str(), "rug-1");
        assert_eq!(parsed.selection_path, PathBuf::from("line.json"));
        assert!(parsed.submit);

        assert!(!args(&["rug-1", "line.json"]).unwrap().submit);
    }

    #[test]
    fn rejects_wrong_arity_and_unknown_flags() {
        assert!(args(&["rug-1"]).is_err());
        assert!(args(&["rug-1", "a.json", "b.json"]).is_err());
        assert!(args(&["rug-1", "a.json", "--dry-run"]).is_err());
        assert!(args(&[" ", "a.json"]).is_err());
    }
}
