use std::io::{self, Write};

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::ClassifyArgs;
use crate::recommend::{build_classification_prompt, parse_classification};

pub fn run(args: ClassifyArgs) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    if let Some(raw) = args.response.as_deref() {
        let Some(use_case) = parse_classification(raw)? else {
            warn!(response = raw, "completion did not name a known use case");
            bail!("unrecognized classification: {raw:?}");
        };
        info!(use_case = use_case.token(), "classification parsed");
        writeln!(output, "{}", use_case.token())?;
    } else if let Some(description) = args.description.as_deref() {
        writeln!(output, "{}", build_classification_prompt(description))?;
    } else {
        bail!("either --description or --response is required");
    }

    output.flush()?;
    Ok(())
}
