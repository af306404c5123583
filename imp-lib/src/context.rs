use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use analysis::domains::BitSetDomain;
use analysis::solvers::{DataflowResult, SolveMonotone};
use utils::DiagnosticEmitter;

use crate::analysis::available_expressions::{AvailEnv, AvailableExpressions};
use crate::analysis::constant_propagation::{ConstEnv, ConstantPropagation};
use crate::analysis::dead_code::find_dead_code;
use crate::analysis::def_use::{DefUseChains, build_def_use_chains, reaching_definitions};
use crate::analysis::dominators::{DominatorAnalysis, DominatorSets};
use crate::analysis::liveness::LiveVariables;
use crate::analysis::loops::{Loop, find_loops};
use crate::analysis::{
    AVAIL_EXPR_ID, AnalysisError, CFG_ID, CONST_PROP_ID, DEAD_CODE_ID, DEF_USE_ID, DOMINATOR_ID,
    ICFG_ID, LIVE_VAR_ID, LOOP_ID,
};
use crate::cfg::{self, Cfg};
use crate::icfg::{self, CallGraph, Icfg};
use crate::ir::{FuncId, Program, StmtIdx};

/// Per-run configuration.
#[derive(Clone, Debug)]
pub struct Options {
    /// Directory the dot renderings are written to; when unset they go
    /// to the emitter's regular output stream instead.
    pub dot_output_dir: Option<PathBuf>,
    /// Whether copies count as uses only when their target is live.
    pub strong_liveness: bool,
    /// Iteration budget per node, forwarded to the solvers.
    pub node_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dot_output_dir: None,
            strong_liveness: true,
            node_limit: SolveMonotone::default().node_limit,
        }
    }
}

/// A per-function analysis result, stored under the identifier of the
/// analysis that produced it.
#[derive(Clone, Debug)]
pub enum FunctionResult {
    ConstantPropagation(DataflowResult<ConstEnv>),
    LiveVariables(DataflowResult<BitSetDomain>),
    Dominators(DominatorSets),
    AvailableExpressions(DataflowResult<AvailEnv>),
    DeadCode(BTreeSet<StmtIdx>),
    Loops(Vec<Loop>),
    DefUse(DefUseChains),
}

/// A whole-program analysis result.
#[derive(Clone, Debug)]
pub enum ProgramResult {
    Icfg(Icfg),
}

/// Owns the program, the control flow graphs and every computed
/// result. Results are memoized, asking for the same analysis twice
/// does not recompute it.
pub struct AnalysisContext {
    program: Program,
    opts: Options,
    cfgs: Vec<Cfg>,
    results: HashMap<(FuncId, &'static str), FunctionResult>,
    program_results: HashMap<&'static str, ProgramResult>,
}

impl AnalysisContext {
    pub fn new(program: Program, opts: Options) -> Self {
        let cfgs = program.functions().iter().map(Cfg::new).collect();
        Self {
            program,
            opts,
            cfgs,
            results: HashMap::new(),
            program_results: HashMap::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn function_id(&self, name: &str) -> Result<FuncId, AnalysisError> {
        self.program
            .function_id(name)
            .ok_or_else(|| AnalysisError::UnknownFunction(name.to_owned()))
    }

    pub fn cfg(&self, func: FuncId) -> &Cfg {
        &self.cfgs[func.0]
    }

    /// Run the analysis with the given identifier on one function,
    /// running its prerequisites first.
    pub fn run(&mut self, id: &str, func: FuncId) -> Result<(), AnalysisError> {
        // The graphs are built eagerly in the constructor.
        if id == CFG_ID {
            return Ok(());
        }
        let id = canonical_id(id)?;
        if self.results.contains_key(&(func, id)) {
            return Ok(());
        }
        let cfg = &self.cfgs[func.0];
        let limit = self.opts.node_limit;
        let result = match id {
            CONST_PROP_ID => FunctionResult::ConstantPropagation(
                ConstantPropagation::analyze(cfg, limit)
                    .ok_or_else(|| self.diverged(CONST_PROP_ID, func))?,
            ),
            LIVE_VAR_ID => {
                let live = LiveVariables {
                    strong: self.opts.strong_liveness,
                };
                FunctionResult::LiveVariables(
                    live.analyze(cfg, limit)
                        .ok_or_else(|| self.diverged(LIVE_VAR_ID, func))?,
                )
            }
            DOMINATOR_ID => FunctionResult::Dominators(
                DominatorAnalysis::analyze(cfg, limit)
                    .ok_or_else(|| self.diverged(DOMINATOR_ID, func))?,
            ),
            AVAIL_EXPR_ID => FunctionResult::AvailableExpressions(
                AvailableExpressions::analyze(cfg, limit)
                    .ok_or_else(|| self.diverged(AVAIL_EXPR_ID, func))?,
            ),
            DEAD_CODE_ID => {
                self.run(CONST_PROP_ID, func)?;
                self.run(LIVE_VAR_ID, func)?;
                let constants = self
                    .constant_propagation(func)
                    .expect("prerequisite was just computed");
                let liveness = self
                    .live_variables(func)
                    .expect("prerequisite was just computed");
                FunctionResult::DeadCode(find_dead_code(&self.cfgs[func.0], constants, liveness))
            }
            LOOP_ID => {
                self.run(DOMINATOR_ID, func)?;
                let doms = self
                    .dominators(func)
                    .expect("prerequisite was just computed");
                FunctionResult::Loops(find_loops(&self.cfgs[func.0], doms))
            }
            DEF_USE_ID => {
                let reaching = reaching_definitions(cfg, limit)
                    .ok_or_else(|| self.diverged(DEF_USE_ID, func))?;
                FunctionResult::DefUse(build_def_use_chains(cfg, &reaching))
            }
            _ => unreachable!("canonical_id covers every per-function analysis"),
        };
        self.results.insert((func, id), result);
        Ok(())
    }

    /// Run an analysis on every function of the program.
    pub fn run_all(&mut self, id: &str) -> Result<(), AnalysisError> {
        for f in 0..self.program.functions().len() {
            self.run(id, FuncId(f))?;
        }
        Ok(())
    }

    pub fn result(&self, id: &str, func: FuncId) -> Option<&FunctionResult> {
        let id = canonical_id(id).ok()?;
        self.results.get(&(func, id))
    }

    pub fn constant_propagation(&self, func: FuncId) -> Option<&DataflowResult<ConstEnv>> {
        match self.results.get(&(func, CONST_PROP_ID)) {
            Some(FunctionResult::ConstantPropagation(result)) => Some(result),
            _ => None,
        }
    }

    pub fn live_variables(&self, func: FuncId) -> Option<&DataflowResult<BitSetDomain>> {
        match self.results.get(&(func, LIVE_VAR_ID)) {
            Some(FunctionResult::LiveVariables(result)) => Some(result),
            _ => None,
        }
    }

    pub fn dominators(&self, func: FuncId) -> Option<&DominatorSets> {
        match self.results.get(&(func, DOMINATOR_ID)) {
            Some(FunctionResult::Dominators(result)) => Some(result),
            _ => None,
        }
    }

    pub fn available_expressions(&self, func: FuncId) -> Option<&DataflowResult<AvailEnv>> {
        match self.results.get(&(func, AVAIL_EXPR_ID)) {
            Some(FunctionResult::AvailableExpressions(result)) => Some(result),
            _ => None,
        }
    }

    pub fn dead_code(&self, func: FuncId) -> Option<&BTreeSet<StmtIdx>> {
        match self.results.get(&(func, DEAD_CODE_ID)) {
            Some(FunctionResult::DeadCode(result)) => Some(result),
            _ => None,
        }
    }

    pub fn loops(&self, func: FuncId) -> Option<&[Loop]> {
        match self.results.get(&(func, LOOP_ID)) {
            Some(FunctionResult::Loops(result)) => Some(result),
            _ => None,
        }
    }

    pub fn def_use(&self, func: FuncId) -> Option<&DefUseChains> {
        match self.results.get(&(func, DEF_USE_ID)) {
            Some(FunctionResult::DefUse(result)) => Some(result),
            _ => None,
        }
    }

    /// Compose the function graphs and the call graph into the
    /// whole-program graph.
    pub fn build_icfg(&mut self, call_graph: &CallGraph) {
        let icfg = Icfg::new(&self.cfgs, call_graph);
        self.program_results.insert(ICFG_ID, ProgramResult::Icfg(icfg));
    }

    pub fn icfg(&self) -> Option<&Icfg> {
        match self.program_results.get(ICFG_ID) {
            Some(ProgramResult::Icfg(icfg)) => Some(icfg),
            None => None,
        }
    }

    /// Render every function graph, and the whole-program graph when it
    /// was built, in dot format. Failing to write a file is reported on
    /// the error stream and does not abort the remaining renderings.
    pub fn dump_dot(&self, diag: &mut DiagnosticEmitter) {
        for (f, graph) in self.cfgs.iter().enumerate() {
            let func = &self.program.functions()[f];
            let rendered = cfg::print(graph, func, &self.program);
            self.emit_dot(&format!("{}.dot", func.name()), &rendered, diag);
        }
        if let Some(icfg) = self.icfg() {
            let rendered = icfg::print(icfg, &self.program);
            self.emit_dot("icfg.dot", &rendered, diag);
        }
    }

    fn emit_dot(&self, file_name: &str, rendered: &str, diag: &mut DiagnosticEmitter) {
        match &self.opts.dot_output_dir {
            Some(dir) => {
                let path = dir.join(file_name);
                if let Err(error) = std::fs::write(&path, rendered) {
                    diag.err_ln(&format!("Failed to write '{}': {error}", path.display()));
                }
            }
            None => diag.out(rendered),
        }
    }

    fn diverged(&self, analysis: &'static str, func: FuncId) -> AnalysisError {
        AnalysisError::Diverged {
            analysis,
            function: self.program.functions()[func.0].name().to_owned(),
        }
    }
}

fn canonical_id(id: &str) -> Result<&'static str, AnalysisError> {
    match id {
        CFG_ID => Err(AnalysisError::NotRunnable {
            analysis: CFG_ID,
            hint: "the graphs are built eagerly, use cfg()",
        }),
        ICFG_ID => Err(AnalysisError::NotRunnable {
            analysis: ICFG_ID,
            hint: "build it with build_icfg()",
        }),
        CONST_PROP_ID => Ok(CONST_PROP_ID),
        LIVE_VAR_ID => Ok(LIVE_VAR_ID),
        DOMINATOR_ID => Ok(DOMINATOR_ID),
        AVAIL_EXPR_ID => Ok(AVAIL_EXPR_ID),
        DEAD_CODE_ID => Ok(DEAD_CODE_ID),
        LOOP_ID => Ok(LOOP_ID),
        DEF_USE_ID => Ok(DEF_USE_ID),
        other => Err(AnalysisError::UnknownAnalysis(other.to_owned())),
    }
}
