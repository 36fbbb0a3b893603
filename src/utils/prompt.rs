use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunChoice {
    /// Run one batch and exit
    RunNow,
    /// Enter the daily scheduler loop
    StartScheduler,
}

/// Ask how to run. "1" runs now; anything else, including no input, starts
/// the scheduler.
pub fn prompt_run_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<RunChoice> {
    writeln!(output, "1) Run now")?;
    writeln!(output, "2) Start scheduler")?;
    write!(output, "Choose: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    if line.trim() == "1" {
        Ok(RunChoice::RunNow)
    } else {
        Ok(RunChoice::StartScheduler)
    }
}
