// SPDX-License-Identifier: Unlicense
use log::{debug, trace};

use crate::{
    ast::{self, Arena, Id, Kind},
    error::OptimizeError,
    group, structure, validate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Pre-order normalization
    Structure,
    /// Post-order promotion
    Group,
}

/// Outcome of a rule that matched a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// The node stays where it is, possibly edited in place.
    Unchanged,
    /// The node is swapped for another one.
    Replace(Id),
    /// The node is dropped from its container.
    Remove,
}

/// A rule returns `None` when its guard does not match.
pub type Rule = fn(&mut Arena, Id) -> Option<Rewrite>;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Upper bound on traversals per phase. `None` runs until the phase
    /// settles, however long that takes.
    pub max_passes: Option<usize>,
    /// Reject trees that still hold unreduced constructs after both phases.
    pub validate: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_passes: None,
            validate: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Traversals made, including the final one that changed nothing
    pub passes: usize,
    pub rewrites: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub structure: PhaseStats,
    pub group: PhaseStats,
}

pub struct Optimizer<'a> {
    arena: &'a mut Arena,
    config: OptimizerConfig,
    changed: bool,
    rewrites: usize,
}

impl<'a> Optimizer<'a> {
    pub fn new(arena: &'a mut Arena, config: OptimizerConfig) -> Self {
        Self {
            arena,
            config,
            changed: false,
            rewrites: 0,
        }
    }

    /// Runs the structure phase and then the group phase to their fixpoints.
    pub fn optimize_program(&mut self, root: Id) -> Result<Report, OptimizeError> {
        self.ensure_program(root)?;

        debug!("optimizing program structure");
        let structure = self.run_phase(Phase::Structure, root)?;

        debug!("generating abstract syntax tree groupings");
        let group = self.run_phase(Phase::Group, root)?;

        if self.config.validate {
            validate::validate(self.arena, root)?;
        }

        Ok(Report { structure, group })
    }

    /// Traverses the tree with the rules of `phase` until a whole pass
    /// rewrites nothing.
    pub fn run_phase(&mut self, phase: Phase, root: Id) -> Result<PhaseStats, OptimizeError> {
        self.ensure_program(root)?;

        let mut passes = 0;
        self.rewrites = 0;

        loop {
            if let Some(limit) = self.config.max_passes {
                if passes >= limit {
                    return Err(OptimizeError::PassLimitExceeded { phase, passes });
                }
            }

            self.changed = false;
            // A program never matches a rule, so the root stays put
            self.visit(phase, root);
            passes += 1;

            if !self.changed {
                break;
            }
        }

        debug!(
            "{phase} phase settled after {passes} passes ({} rewrites)",
            self.rewrites
        );

        Ok(PhaseStats {
            passes,
            rewrites: self.rewrites,
        })
    }

    fn ensure_program(&self, root: Id) -> Result<(), OptimizeError> {
        match self.arena[root].kind() {
            Kind::Program => Ok(()),
            found => Err(OptimizeError::NotAProgram { found }),
        }
    }

    /// Visits `id` and its subtree. Returns the node that now stands in its
    /// place, or `None` if it was removed.
    fn visit(&mut self, phase: Phase, id: Id) -> Option<Id> {
        let parent = self.arena[id].parent;
        let mut current = id;

        if phase == Phase::Structure {
            current = self.apply(phase, current, parent)?;
        }

        let visited = self
            .arena[current]
            .children()
            .into_iter()
            .map(|child| self.visit(phase, child))
            .collect();
        self.arena[current].kind.set_children(visited);
        ast::adopt(self.arena, current);

        if phase == Phase::Group {
            current = self.apply(phase, current, parent)?;
        }

        Some(current)
    }

    fn apply(&mut self, phase: Phase, id: Id, parent: Option<Id>) -> Option<Id> {
        let applied = match phase {
            Phase::Structure => structure::rewrite(self.arena, id),
            Phase::Group => group::rewrite(self.arena, id),
        };
        let Some((rule, rewrite)) = applied else {
            return Some(id);
        };

        self.changed = true;
        self.rewrites += 1;

        let kind = self.arena[id].kind();
        match rewrite {
            Rewrite::Unchanged => {
                trace!("[{phase}] {rule}: {kind} updated in place");
                Some(id)
            }
            Rewrite::Replace(new) => {
                self.arena[new].parent = parent;
                trace!("[{phase}] {rule}: {kind} -> {}", self.arena[new].kind());
                Some(new)
            }
            Rewrite::Remove => {
                trace!("[{phase}] {rule}: {kind} removed");
                None
            }
        }
    }
}

/// Optimizes `root` with the default configuration.
pub fn optimize(arena: &mut Arena, root: Id) -> Result<Report, OptimizeError> {
    Optimizer::new(arena, OptimizerConfig::default()).optimize_program(root)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use rstest::rstest;

    use super::*;
    use crate::{ast::NodeKind, parser};

    fn assert_links_consistent(arena: &Arena, id: Id) {
        for child in arena[id].children() {
            assert_eq!(arena[child].parent, Some(id), "stale parent under {id:?}");
            assert_links_consistent(arena, child);
        }
    }

    fn capped(max_passes: usize) -> OptimizerConfig {
        OptimizerConfig {
            max_passes: Some(max_passes),
            validate: true,
        }
    }

    #[test]
    fn refuses_roots_that_are_not_programs() -> Result<()> {
        let (mut arena, root) = parser::parse("block.sketch", "(Block (Statement let x))")?;
        let before = arena[root].clone();

        let err = optimize(&mut arena, root).unwrap_err();
        assert_eq!(err, OptimizeError::NotAProgram { found: Kind::Block });
        assert_eq!(arena[root], before);
        Ok(())
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4)]
    #[case(9)]
    fn parenthesis_elision_ignores_nesting_depth(#[case] depth: usize) -> Result<()> {
        let mut nested = "(Expression 1 '+' 2)".to_owned();
        for _ in 0..depth {
            nested = format!("(Expression '(' {nested} ')')");
        }

        let (mut wrapped, wrapped_root) =
            parser::parse("wrapped.sketch", &format!("(Program {nested})"))?;
        let (mut bare, bare_root) = parser::parse("bare.sketch", "(Program (Expression 1 '+' 2))")?;

        let mut optimizer = Optimizer::new(&mut wrapped, capped(64));
        optimizer.run_phase(Phase::Structure, wrapped_root)?;
        let mut optimizer = Optimizer::new(&mut bare, capped(64));
        optimizer.run_phase(Phase::Structure, bare_root)?;

        let dump = |arena: &Arena, root| crate::dump::dump(arena, root, &Default::default());
        assert_eq!(dump(&wrapped, wrapped_root), dump(&bare, bare_root));
        Ok(())
    }

    #[test]
    fn group_phase_is_idempotent() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "idempotent.sketch",
            r#"
            (Program
              (Statement let x '=' (Expression 1 '+' (Expression 2 '*' 3)) ';')
              (Statement (IfStatementPrimitive if '(' (Expression x '<' 10) ')'
                '{' (Block (Statement x '=' (Expression x '+' 1) ';')) '}')))
            "#,
        )?;

        let first = optimize(&mut arena, root)?;
        assert!(first.group.rewrites > 0);

        let mut optimizer = Optimizer::new(&mut arena, OptimizerConfig::default());
        let again = optimizer.run_phase(Phase::Group, root)?;
        assert_eq!(again, PhaseStats { passes: 1, rewrites: 0 });
        Ok(())
    }

    #[test]
    fn both_phases_settle_below_the_cap() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "settle.sketch",
            r#"
            (Program
              (Statement (Expression
                func fib '(' (ArgumentList n) ')' '{'
                (Block
                  (Statement (IfStatementPrimitive if '(' (Expression n '<' 2) ')'
                    '{' (Block (Statement n ';')) '}'
                    else '{' (Block (Statement
                      (Expression (Expression fib '(' (ExpressionList (Expression n '-' 1)) ')')
                                  '+'
                                  (Expression fib '(' (ExpressionList (Expression n '-' 2)) ')'))
                      ';')) '}')))
                '}'))
              (Statement (Expression print '(' (ExpressionList (Expression fib '(' (ExpressionList 10) ')')) ')') ';'))
            "#,
        )?;

        let cap = 32;
        let report = Optimizer::new(&mut arena, capped(cap)).optimize_program(root)?;
        assert!(report.structure.passes < cap);
        assert!(report.group.passes < cap);
        assert_links_consistent(&arena, root);
        Ok(())
    }

    #[test]
    fn tight_cap_reports_the_unsettled_phase() -> Result<()> {
        let (mut arena, root) = parser::parse("cap.sketch", "(Program (Expression '(' (Expression 1) ')'))")?;

        let err = Optimizer::new(&mut arena, capped(1))
            .optimize_program(root)
            .unwrap_err();
        assert_eq!(
            err,
            OptimizeError::PassLimitExceeded {
                phase: Phase::Structure,
                passes: 1
            }
        );
        Ok(())
    }

    #[test]
    fn removed_children_are_compacted_and_relinked() -> Result<()> {
        let (mut arena, root) = parser::parse(
            "compact.sketch",
            "(Program (Statement (Expression f '(' (ExpressionList a ',' b ',' c) ')') ';'))",
        )?;

        optimize(&mut arena, root)?;
        assert_links_consistent(&arena, root);

        let [statement] = arena[root].children()[..] else {
            panic!("expected one statement");
        };
        let NodeKind::Call { arguments, .. } = arena[statement].kind else {
            panic!("expected a call, got {}", arena[statement].kind());
        };
        assert_eq!(arena[arguments].children().len(), 3);
        Ok(())
    }

    #[test]
    fn program_metadata_survives() -> Result<()> {
        let (mut arena, root) = parser::parse("meta.sketch", "(Program (Statement let x ';'))")?;
        optimize(&mut arena, root)?;

        let NodeKind::Program(program) = &arena[root].kind else {
            panic!("root is no longer a program");
        };
        assert_eq!(program.file, "meta.sketch");
        assert!(program.should_execute);
        Ok(())
    }
}
