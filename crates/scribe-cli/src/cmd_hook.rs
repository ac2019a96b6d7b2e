use std::io::Read;

/// `scribe hook claude`: stdin payload in, hook JSON out.
pub fn claude() -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut stdin_buf) {
        tracing::warn!(error = %e, "cannot read hook stdin");
        return Ok(());
    }
    tracing::debug!(bytes = stdin_buf.len(), "hook payload");

    match scribe_bridge_claude::hook_entrypoint_from_stdin(&stdin_buf) {
        Ok(result) => {
            if let Some(output) = &result.stdout {
                print!("{output}");
            }
            if let Some(warning) = &result.stderr {
                eprintln!("{warning}");
                // Exit 1 = non-blocking warning shown to the user.
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            // Internal errors never block the host.
            tracing::warn!(error = %e, "hook failed");
            Ok(())
        }
    }
}
