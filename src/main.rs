mod audio;
mod config;
mod error;
mod library;
mod playlist;
mod runtime;
#[cfg(test)]
mod testing;
mod timer;
mod track;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()?;
    Ok(())
}
