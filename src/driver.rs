// SPDX-License-Identifier: Unlicense
use std::{io::Read, path::Path};

use crate::{
    ast,
    dump::{self, DumpOptions},
    optimizer::{Optimizer, OptimizerConfig, Report},
    parser,
};
use anyhow::{anyhow, Context, Result};

pub fn read_file(source: &Path) -> Result<String> {
    let mut buf = String::new();
    let mut f = std::fs::File::open(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    f.read_to_string(&mut buf)
        .with_context(|| format!("failed to read {}", source.display()))?;
    Ok(buf)
}

/// Reads a sketch and promotes it into a typed program.
pub fn optimize_source(
    name: &str,
    source: &str,
    config: OptimizerConfig,
) -> Result<(ast::Arena, ast::Id, Report)> {
    let (mut arena, root) = parser::parse(name, source)?;
    let report = Optimizer::new(&mut arena, config)
        .optimize_program(root)
        .with_context(|| format!("failed to optimize {}", name))?;
    Ok((arena, root, report))
}

/// Optimizes the sketch at `source` and renders the resulting tree.
pub fn compile(source: &Path, config: OptimizerConfig, options: &DumpOptions) -> Result<String> {
    let src = read_file(source)?;
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(anyhow!("invalid source file name: {}", source.display()))?;
    let (arena, root, report) = optimize_source(name, &src, config)?;
    log::debug!(
        "{}: structure settled in {} passes, grouping in {}",
        name,
        report.structure.passes,
        report.group.passes
    );
    Ok(dump::dump(&arena, root, options))
}
