//! Dependency resolution over agents and skills.
//!
//! The graph is rebuilt on demand from a flat list of agent specs: two
//! explicit adjacency maps (`requires_out`, `required_by_in`) plus the
//! soft `recommends` edges. There is no shared mutable state; everything is
//! indexed by name.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use semver::Version;

use crate::component::{AgentSpec, SkillDependencyRef};
use crate::errors::{CoreError, Result};

/// Directed dependency graph over agents.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    requires_out: BTreeMap<String, Vec<String>>,
    required_by_in: BTreeMap<String, Vec<String>>,
    recommends_out: BTreeMap<String, Vec<String>>,
}

/// One step of an activation plan, dependency-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub name: String,
    /// False when the agent is already active and only appears for context.
    pub needs_activation: bool,
}

impl DependencyGraph {
    /// Build the graph from agent specs.
    ///
    /// Edges may point at unknown agents; that is only an error once a
    /// closure actually crosses such an edge.
    pub fn from_agents<'a>(agents: impl IntoIterator<Item = &'a AgentSpec>) -> Self {
        let mut graph = Self::default();
        for agent in agents {
            graph.insert(
                &agent.name,
                &agent.dependencies.requires,
                &agent.dependencies.recommends,
            );
        }
        graph
    }

    fn insert(&mut self, name: &str, requires: &[String], recommends: &[String]) {
        self.requires_out
            .insert(name.to_string(), requires.to_vec());
        for dep in requires {
            self.required_by_in
                .entry(dep.clone())
                .or_default()
                .push(name.to_string());
        }
        self.recommends_out
            .insert(name.to_string(), recommends.to_vec());
    }

    /// Agent names known to the graph.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.requires_out.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.requires_out.contains_key(name)
    }

    /// Hard dependencies of `name`, in declaration order.
    pub fn requires_of(&self, name: &str) -> &[String] {
        self.requires_out.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Soft recommendations of `name`.
    pub fn recommends_of(&self, name: &str) -> &[String] {
        self.recommends_out
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Verify the whole `requires` graph is acyclic.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut color: BTreeMap<&str, Color> = BTreeMap::new();
        let mut stack: Vec<&str> = Vec::new();
        for start in self.requires_out.keys() {
            if color.get(start.as_str()).copied().unwrap_or(Color::White) == Color::White {
                self.dfs(start, &mut color, &mut stack)?;
            }
        }
        Ok(())
    }

    fn dfs<'a>(
        &'a self,
        node: &'a str,
        color: &mut BTreeMap<&'a str, Color>,
        stack: &mut Vec<&'a str>,
    ) -> Result<()> {
        color.insert(node, Color::Gray);
        stack.push(node);
        for dep in self.requires_of(node) {
            match color.get(dep.as_str()).copied().unwrap_or(Color::White) {
                Color::White => {
                    // Unknown targets are leaves here; closure() reports them.
                    if self.contains(dep) {
                        self.dfs(dep, color, stack)?;
                    }
                }
                Color::Gray => {
                    let pos = stack
                        .iter()
                        .position(|n| *n == dep.as_str())
                        .unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[pos..].iter().map(|s| s.to_string()).collect();
                    path.push(dep.clone());
                    return Err(CoreError::CycleDetected { path });
                }
                Color::Black => {}
            }
        }
        stack.pop();
        color.insert(node, Color::Black);
        Ok(())
    }

    /// Compute the activation closure of `seed`: the minimal set containing
    /// the seed and everything transitively reachable over `requires`,
    /// ordered dependency-first (reverse topological order).
    pub fn closure(&self, seed: &str) -> Result<Vec<String>> {
        if !self.contains(seed) {
            return Err(CoreError::MissingDependency {
                agent: seed.to_string(),
                requires: seed.to_string(),
            });
        }

        // Reachability first, so cycle errors only mention relevant nodes.
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        reachable.insert(seed.to_string());
        queue.push_back(seed.to_string());
        while let Some(current) = queue.pop_front() {
            for dep in self.requires_of(&current) {
                if !self.contains(dep) {
                    return Err(CoreError::MissingDependency {
                        agent: current.clone(),
                        requires: dep.clone(),
                    });
                }
                if reachable.insert(dep.clone()) {
                    queue.push_back(dep.clone());
                }
            }
        }

        // Post-order DFS emits dependencies before their dependents.
        let mut color: BTreeMap<&str, Color> = BTreeMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut order: Vec<String> = Vec::new();
        self.post_order(seed, &mut color, &mut stack, &mut order)?;
        debug_assert_eq!(order.len(), reachable.len());
        Ok(order)
    }

    fn post_order<'a>(
        &'a self,
        node: &'a str,
        color: &mut BTreeMap<&'a str, Color>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        color.insert(node, Color::Gray);
        stack.push(node);
        for dep in self.requires_of(node) {
            match color.get(dep.as_str()).copied().unwrap_or(Color::White) {
                Color::White => self.post_order(dep, color, stack, order)?,
                Color::Gray => {
                    let pos = stack
                        .iter()
                        .position(|n| *n == dep.as_str())
                        .unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[pos..].iter().map(|s| s.to_string()).collect();
                    path.push(dep.clone());
                    return Err(CoreError::CycleDetected { path });
                }
                Color::Black => {}
            }
        }
        stack.pop();
        color.insert(node, Color::Black);
        order.push(node.to_string());
        Ok(())
    }

    /// Build an activation plan for `seed` given the currently active set.
    pub fn activation_plan(
        &self,
        seed: &str,
        active: &BTreeSet<String>,
    ) -> Result<Vec<PlanStep>> {
        Ok(self
            .closure(seed)?
            .into_iter()
            .map(|name| {
                let needs_activation = !active.contains(&name);
                PlanStep {
                    name,
                    needs_activation,
                }
            })
            .collect())
    }

    /// Active agents whose `requires` closure contains `candidate`.
    ///
    /// Non-empty means deactivating `candidate` would strand dependents.
    pub fn active_dependents(
        &self,
        candidate: &str,
        active: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut blocked: BTreeSet<String> = BTreeSet::new();
        // Walk the reverse edges; anything active upstream blocks.
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        queue.push_back(candidate);
        seen.insert(candidate);
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.required_by_in.get(current) {
                for parent in parents {
                    if seen.insert(parent) {
                        if active.contains(parent) {
                            blocked.insert(parent.clone());
                        }
                        queue.push_back(parent);
                    }
                }
            }
        }
        blocked.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Resolve one skill dependency against the installed versions of that skill.
///
/// `available` maps a skill name to every installed version. The highest
/// satisfying version wins; no satisfying version is a hard error.
pub fn resolve_skill_dependency(
    dep: &SkillDependencyRef,
    available: &BTreeMap<String, Vec<Version>>,
) -> Result<Version> {
    let versions = available
        .get(&dep.name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::ComponentNotFound {
            kind: crate::component::ComponentKind::Skill,
            name: dep.name.clone(),
        })?;
    dep.spec
        .select(versions)
        .cloned()
        .ok_or_else(|| CoreError::NoCompatibleVersion {
            name: dep.name.clone(),
            spec: dep.spec.to_string(),
            available: versions.iter().map(|v| v.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DependenciesSpec;

    fn agent(name: &str, requires: &[&str], recommends: &[&str]) -> AgentSpec {
        AgentSpec {
            name: name.to_string(),
            dependencies: DependenciesSpec {
                requires: requires.iter().map(|s| s.to_string()).collect(),
                recommends: recommends.iter().map(|s| s.to_string()).collect(),
            },
            ..Default::default()
        }
    }

    fn graph(specs: &[AgentSpec]) -> DependencyGraph {
        DependencyGraph::from_agents(specs.iter())
    }

    #[test]
    fn closure_is_dependency_first() {
        let g = graph(&[
            agent("a", &["b", "c"], &[]),
            agent("b", &["c"], &[]),
            agent("c", &[], &[]),
        ]);
        let order = g.closure("a").unwrap();
        assert_eq!(order.last().unwrap(), "a");
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("c") < pos("b"));
        assert!(pos("b") < pos("a"));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn closure_of_leaf_is_singleton() {
        let g = graph(&[agent("solo", &[], &[])]);
        assert_eq!(g.closure("solo").unwrap(), vec!["solo"]);
    }

    #[test]
    fn cycle_path_starts_and_ends_equal() {
        let g = graph(&[
            agent("a", &["b"], &[]),
            agent("b", &["c"], &[]),
            agent("c", &["a"], &[]),
        ]);
        let err = g.closure("a").unwrap_err();
        match err {
            CoreError::CycleDetected { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.len() >= 3);
            }
            other => panic!("expected cycle, got {other}"),
        }
        assert!(g.ensure_acyclic().is_err());
    }

    #[test]
    fn self_cycle_is_detected() {
        let g = graph(&[agent("a", &["a"], &[])]);
        let err = g.closure("a").unwrap_err();
        match err {
            CoreError::CycleDetected { path } => assert_eq!(path, vec!["a", "a"]),
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn missing_dependency_names_the_requirer() {
        let g = graph(&[agent("a", &["ghost"], &[])]);
        match g.closure("a").unwrap_err() {
            CoreError::MissingDependency { agent, requires } => {
                assert_eq!(agent, "a");
                assert_eq!(requires, "ghost");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn recommends_do_not_enter_closure() {
        let g = graph(&[
            agent("a", &["b"], &["shiny"]),
            agent("b", &[], &[]),
            agent("shiny", &[], &[]),
        ]);
        let order = g.closure("a").unwrap();
        assert!(!order.contains(&"shiny".to_string()));
        assert_eq!(g.recommends_of("a"), &["shiny".to_string()]);
    }

    #[test]
    fn active_dependents_blocks_deactivation() {
        let g = graph(&[
            agent("a", &["b"], &[]),
            agent("b", &["c"], &[]),
            agent("c", &[], &[]),
        ]);
        let active: BTreeSet<String> =
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(g.active_dependents("c", &active), vec!["a", "b"]);
        assert_eq!(g.active_dependents("a", &active), Vec::<String>::new());

        let only_c: BTreeSet<String> = [String::from("c")].into_iter().collect();
        assert!(g.active_dependents("c", &only_c).is_empty());
    }

    #[test]
    fn plan_marks_already_active() {
        let g = graph(&[agent("a", &["b"], &[]), agent("b", &[], &[])]);
        let active: BTreeSet<String> = [String::from("b")].into_iter().collect();
        let plan = g.activation_plan("a", &active).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(!plan[0].needs_activation);
        assert!(plan[1].needs_activation);
    }

    #[test]
    fn deep_chain_resolves_in_order() {
        let mut specs = Vec::new();
        for i in 0..200 {
            let requires: Vec<String> = if i + 1 < 200 {
                vec![format!("link-{:03}", i + 1)]
            } else {
                Vec::new()
            };
            specs.push(AgentSpec {
                name: format!("link-{i:03}"),
                dependencies: DependenciesSpec {
                    requires,
                    recommends: Vec::new(),
                },
                ..Default::default()
            });
        }
        let g = DependencyGraph::from_agents(specs.iter());
        let order = g.closure("link-000").unwrap();
        assert_eq!(order.len(), 200);
        assert_eq!(order.first().unwrap(), "link-199");
        assert_eq!(order.last().unwrap(), "link-000");
        assert!(g.ensure_acyclic().is_ok());
    }

    #[test]
    fn skill_resolution_picks_highest_match() {
        let mut available = BTreeMap::new();
        available.insert(
            "threat-modeling".to_string(),
            vec![
                Version::parse("1.0.0").unwrap(),
                Version::parse("1.3.0").unwrap(),
                Version::parse("2.0.0").unwrap(),
            ],
        );
        let dep = SkillDependencyRef::parse("threat-modeling@^1.0.0").unwrap();
        assert_eq!(
            resolve_skill_dependency(&dep, &available).unwrap(),
            Version::parse("1.3.0").unwrap()
        );

        let dep = SkillDependencyRef::parse("threat-modeling@>=3.0.0").unwrap();
        match resolve_skill_dependency(&dep, &available).unwrap_err() {
            CoreError::NoCompatibleVersion { available, .. } => {
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn unknown_skill_is_not_found() {
        let available = BTreeMap::new();
        let dep = SkillDependencyRef::parse("ghost@latest").unwrap();
        assert!(matches!(
            resolve_skill_dependency(&dep, &available).unwrap_err(),
            CoreError::ComponentNotFound { .. }
        ));
    }
}
