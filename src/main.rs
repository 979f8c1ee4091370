use anyhow::Context;

fn main() -> anyhow::Result<()> {
    coursekit::run().context("coursekit failed")
}
