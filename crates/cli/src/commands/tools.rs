//! `planloop tools`: list the registered tools.

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = planloop_tools::default_registry()?;

    for tool in registry.describe_all() {
        println!("- {tool}");
    }

    Ok(())
}
