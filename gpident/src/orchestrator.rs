//! The concurrent search orchestrator (spec.md C11 / §4.11) and the post-search target-decoy
//! FDR reduction that fills in each [`crate::psm::Psm`]'s q-value (spec.md C10).
//!
//! Grounded in the teacher's `mzalign::index::AlignIndex` `par_iter` query methods (parallel
//! work over a read-only, immutable index, spec.md §9: "ad-hoc parallelism ... introduced at the
//! spectrum level only") and the per-input iteration idiom of `mzident::source::PSMIter`
//! (spec.md §5: "a single producer that reads spectra sequentially ... places them on the
//! queue"). `rayon`'s `into_par_iter`/`ParallelBridge` stand in for the explicit bounded-queue +
//! worker-pool machinery spec.md §5 describes, since every spectrum is scored independently and
//! read-only state (the two candidate indices) is shared without synchronization.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use context_error::{BoxedError, ErrorKind};
use gpannotate::prelude::{
    BinningParams, LAG_WINDOW, NumericalErrorKind, ProcessedSpectrum, Spectrum, SpResult,
    build_theoretical, preprocess, score_sp, score_xcorr, top_k_by_sp, vectorize,
};
use gpindex::CandidateIndex;
use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::fdr::{ScoredPsm, compute_fdr};
use crate::psm::{CandidateSummary, Psm};

/// A single fatal-or-recoverable error kind for [`search`], re-kinding whichever of
/// `gpindex::EmptyIndexErrorKind` / `gpannotate`'s `NumericalErrorKind` triggered it (spec.md §7:
/// both `EmptyIndexError` and `NumericalError` are fatal, aborting the run).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchErrorKind {
    /// The target or decoy candidate index has no records (spec.md §7 `EmptyIndexError`).
    EmptyIndex,
    /// The FFT-based cross-correlation produced a non-finite value (spec.md §7 `NumericalError`).
    Numerical,
}

impl ErrorKind for SearchErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, (): Self::Settings) -> bool {
        false
    }
    fn is_error(&self, (): Self::Settings) -> bool {
        true
    }
}

/// Cooperative cancellation flag checked between spectra (spec.md §5 Cancellation: "workers
/// finish their current spectrum, drain the queue without processing, and exit").
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Workers already scoring a spectrum finish it; every spectrum not
    /// yet started is recorded as skipped ([`SkipReason::Cancelled`]).
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a spectrum produced no PSM (spec.md §7: "every skipped unit appears in the summary").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SkipReason {
    /// The spectrum is not an MS2 (fragmentation) scan.
    NotMs2,
    /// Precursor charge is negative, or positive but the spectrum carries no precursor m/z.
    Malformed,
    /// Precursor charge is `0` (unknown) and the orchestrator's charge-state guesses (spec.md
    /// §4.4: `z in {2, 3, 4}`) yielded no candidates either.
    NoCharge,
    /// The candidate index query (after any charge-state expansion) returned nothing.
    NoCandidates,
    /// The run was cancelled before this spectrum was taken off the queue.
    Cancelled,
}

/// Per-run bookkeeping: how many spectra were seen, how many produced PSMs, and a breakdown of
/// why the rest were skipped (spec.md §7 propagation policy, §2 run summary).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Total spectra offered to [`search`].
    pub total_spectra: usize,
    /// Spectra that produced at least one PSM (target or decoy).
    pub scored_spectra: usize,
    /// Counts of skipped spectra, by reason.
    pub skipped: HashMap<SkipReason, usize>,
}

impl RunSummary {
    fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }
}

/// The result of [`search`]: every PSM produced (q-value not yet assigned — see
/// [`assign_q_values`]), plus the run summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Every PSM produced across every scored spectrum, target and decoy mixed.
    pub psms: Vec<Psm>,
    /// Per-run bookkeeping (spec.md §7).
    pub summary: RunSummary,
}

enum SpectrumResult {
    Psms(Vec<Psm>),
    Skipped(SkipReason),
}

/// Candidate identity for the per-worker theoretical-vector memoization of spec.md §4.11
/// ("memoized per candidate within a run ... kept per worker to avoid cross-thread
/// synchronization"): a (peptide, glycan) pair is identified by the addresses of the records the
/// immutable [`CandidateIndex`] owns, which are stable for the index's whole lifetime.
type CandidateKey = (usize, usize);

/// Monotonically increasing identifier for each [`search`] invocation, used to scope the
/// per-worker theoretical-vector cache below to a single run.
static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a fresh run id for a new [`search`] call.
fn next_run_id() -> u64 {
    NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
    // Tagged with the run id it was populated under: a worker thread is reused by `rayon`'s
    // global pool across unrelated `search` calls, and `CandidateKey` addresses can be reused
    // by a later `CandidateIndex` once an earlier one is dropped, so a cache that outlived its
    // run could hand back a theoretical vector for the wrong candidate (or one built on a
    // different `BinningParams`, which `score_sp`/`score_xcorr` would then panic on for a
    // length mismatch). Seeing a new run id clears the map before reuse.
    static THEORETICAL_CACHE: RefCell<(u64, HashMap<CandidateKey, Rc<Vec<f64>>>)> =
        RefCell::new((u64::MAX, HashMap::new()));
}

fn candidate_key(hit: &gpindex::CandidateHit<'_>) -> CandidateKey {
    (
        ptr::from_ref(hit.peptide) as usize,
        ptr::from_ref(hit.glycan) as usize,
    )
}

/// Build (or fetch from the calling worker's cache) the theoretical vector for `hit` (spec.md
/// C6), scoped to the run identified by `run_id`. The `Rc` never leaves the thread that built
/// it — only the `thread_local!` cache is shared across spectra processed by the same worker,
/// exactly the single-writer-per-worker shape spec.md §4.11/§5 describes.
fn theoretical_vector(
    hit: &gpindex::CandidateHit<'_>,
    params: &BinningParams,
    max_charge: u8,
    run_id: u64,
) -> Rc<Vec<f64>> {
    let key = candidate_key(hit);
    THEORETICAL_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.0 != run_id {
            cache.1.clear();
            cache.0 = run_id;
        }
        if let Some(vector) = cache.1.get(&key) {
            return Rc::clone(vector);
        }
        let peaks = build_theoretical(hit.peptide, hit.glycan, max_charge);
        let vector = Rc::new(vectorize(&peaks, params));
        cache.1.insert(key, Rc::clone(&vector));
        vector
    })
}

/// Query `index` at `precursor_mz`/`tolerance_ppm`. A known charge (`>= 1`) is queried directly;
/// an unknown charge (`0`) is expanded over `z in {2, 3, 4}` per spec.md §4.4's orchestrator-level
/// policy, deduplicating candidates that fall in more than one charge assumption's mass window.
fn query_candidates<'i>(
    index: &'i CandidateIndex,
    precursor_mz: f64,
    charge: i32,
    tolerance_ppm: f64,
) -> Vec<gpindex::CandidateHit<'i>> {
    let charges: &[i32] = if charge >= 1 { &[charge] } else { &[2, 3, 4] };

    let mut seen = std::collections::HashSet::new();
    let mut hits = Vec::new();
    for &z in charges {
        for hit in index.query(precursor_mz, z, tolerance_ppm) {
            if seen.insert(candidate_key(&hit)) {
                hits.push(hit);
            }
        }
    }
    hits
}

/// Score every candidate `hit` against `processed` via Sp (C7) then XCorr (C8), keeping the
/// `sp_top_k` Sp-ranked candidates and the `psms_per_spectrum` best by XCorr (spec.md §4.11 steps
/// 4-6).
///
/// # Errors
/// Returns a `NumericalError` (spec.md §7, fatal) if the FFT-based XCorr produces a non-finite
/// value for any candidate.
fn score_hits(
    scan_id: &str,
    processed: &ProcessedSpectrum,
    hits: Vec<gpindex::CandidateHit<'_>>,
    config: &SearchConfig,
    params: &BinningParams,
    is_decoy: bool,
    run_id: u64,
) -> Result<Vec<Psm>, BoxedError<'static, NumericalErrorKind>> {
    let scored: Vec<(gpindex::CandidateHit<'_>, SpResult)> = hits
        .into_iter()
        .map(|hit| {
            let theoretical = theoretical_vector(&hit, params, config.max_charge, run_id);
            let sp = score_sp(processed.vector(), &theoretical);
            (hit, sp)
        })
        .collect();

    let top = top_k_by_sp(scored, config.sp_top_k);

    let mut with_xcorr = Vec::with_capacity(top.len());
    for (hit, sp) in top {
        let theoretical = theoretical_vector(&hit, params, config.max_charge, run_id);
        let result = score_xcorr(processed.vector(), &theoretical, LAG_WINDOW)?;
        with_xcorr.push((hit, sp, result.xcorr));
    }

    with_xcorr.sort_by(|a, b| b.2.partial_cmp(&a.2).expect("xcorr scores are always finite"));
    with_xcorr.truncate(config.psms_per_spectrum.max(1));

    Ok(with_xcorr
        .into_iter()
        .map(|(hit, sp, xcorr)| Psm {
            scan_id: scan_id.to_string(),
            candidate: CandidateSummary::from_hit(&hit),
            sp: sp.sp,
            xcorr,
            ppm_error: hit.ppm_error,
            is_decoy,
            q_value: None,
        })
        .collect())
}

/// Score one spectrum against both the target and decoy indices (spec.md §4.11 steps 1-3, 7),
/// reusing the one preprocessed vector for both passes.
fn process_spectrum(
    spectrum: &Spectrum,
    target_index: &CandidateIndex,
    decoy_index: &CandidateIndex,
    config: &SearchConfig,
    params: &BinningParams,
    cancellation: &CancellationToken,
    run_id: u64,
) -> Result<SpectrumResult, BoxedError<'static, NumericalErrorKind>> {
    if cancellation.is_cancelled() {
        return Ok(SpectrumResult::Skipped(SkipReason::Cancelled));
    }
    if spectrum.ms_level() != 2 {
        return Ok(SpectrumResult::Skipped(SkipReason::NotMs2));
    }
    if spectrum.precursor_charge() < 0 {
        return Ok(SpectrumResult::Skipped(SkipReason::Malformed));
    }
    let Some(precursor_mz) = spectrum.precursor_mz() else {
        return Ok(SpectrumResult::Skipped(SkipReason::Malformed));
    };

    let target_hits = query_candidates(
        target_index,
        precursor_mz,
        spectrum.precursor_charge(),
        config.tolerance_ppm,
    );
    let decoy_hits = query_candidates(
        decoy_index,
        precursor_mz,
        spectrum.precursor_charge(),
        config.tolerance_ppm,
    );
    if target_hits.is_empty() && decoy_hits.is_empty() {
        let reason = if spectrum.precursor_charge() == 0 {
            SkipReason::NoCharge
        } else {
            SkipReason::NoCandidates
        };
        return Ok(SpectrumResult::Skipped(reason));
    }

    let processed = preprocess(spectrum, params);
    let mut psms = Vec::new();
    if !target_hits.is_empty() {
        psms.extend(score_hits(
            spectrum.scan_id(),
            &processed,
            target_hits,
            config,
            params,
            false,
            run_id,
        )?);
    }
    if !decoy_hits.is_empty() {
        psms.extend(score_hits(
            spectrum.scan_id(),
            &processed,
            decoy_hits,
            config,
            params,
            true,
            run_id,
        )?);
    }

    Ok(SpectrumResult::Psms(psms))
}

/// Score every spectrum in `spectra` in parallel and fold the per-spectrum outcomes into one
/// [`SearchOutcome`]. Split out of [`search`] so it can be handed to `rayon::ThreadPool::install`
/// without an intermediate closure capturing `search`'s whole environment.
fn run_spectra(
    spectra: Vec<Spectrum>,
    target_index: &CandidateIndex,
    decoy_index: &CandidateIndex,
    config: &SearchConfig,
    params: &BinningParams,
    cancellation: &CancellationToken,
    run_id: u64,
) -> Result<SearchOutcome, BoxedError<'static, SearchErrorKind>> {
    let total_spectra = spectra.len();
    let results: Vec<Result<SpectrumResult, BoxedError<'static, NumericalErrorKind>>> = spectra
        .into_par_iter()
        .map(|spectrum| {
            process_spectrum(&spectrum, target_index, decoy_index, config, params, cancellation, run_id)
        })
        .collect();

    let mut summary = RunSummary {
        total_spectra,
        ..RunSummary::default()
    };
    let mut psms = Vec::new();
    for result in results {
        match result.map_err(|e| {
            e.to_owned()
                .convert::<SearchErrorKind, BoxedError<'static, SearchErrorKind>>(|_| SearchErrorKind::Numerical)
        })? {
            SpectrumResult::Psms(found) => {
                summary.scored_spectra += 1;
                psms.extend(found);
            }
            SpectrumResult::Skipped(reason) => summary.record_skip(reason),
        }
    }
    Ok(SearchOutcome { psms, summary })
}

/// Drive every spectrum in `spectra` through C4 -> C5 -> C6 -> C7 -> C8 against both `target_index`
/// and `decoy_index` (spec.md C11 / §4.11), on a worker pool sized by `config.workers` (spec.md
/// §5: "default W is the number of physical cores").
///
/// Does not compute FDR/q-values; call [`assign_q_values`] on the returned PSMs once the whole
/// batch (target + decoy, across every spectrum) is available, since that is a global reduction
/// spec.md §4.10/§5 requires to happen only after the input stream is exhausted.
///
/// # Errors
/// Returns `SearchErrorKind::EmptyIndex` if either index is empty (spec.md §7, fatal at start),
/// or `SearchErrorKind::Numerical` if any candidate's XCorr computation produced a non-finite
/// value (spec.md §7, fatal — the run is aborted rather than emit a meaningless PSM).
pub fn search(
    spectra: Vec<Spectrum>,
    target_index: &CandidateIndex,
    decoy_index: &CandidateIndex,
    config: &SearchConfig,
    cancellation: &CancellationToken,
) -> Result<SearchOutcome, BoxedError<'static, SearchErrorKind>> {
    target_index.require_non_empty().map_err(|e| {
        e.to_owned()
            .convert::<SearchErrorKind, BoxedError<'static, SearchErrorKind>>(|_| SearchErrorKind::EmptyIndex)
    })?;
    decoy_index.require_non_empty().map_err(|e| {
        e.to_owned()
            .convert::<SearchErrorKind, BoxedError<'static, SearchErrorKind>>(|_| SearchErrorKind::EmptyIndex)
    })?;

    let params = BinningParams {
        bin_width: config.bin_width,
        max_mz: config.max_mz,
        regions: config.regions,
        ..BinningParams::default()
    };
    let run_id = next_run_id();

    let outcome = if let Some(workers) = config.workers {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .expect("building a rayon thread pool with a caller-supplied worker count");
        pool.install(|| run_spectra(spectra, target_index, decoy_index, config, &params, cancellation, run_id))?
    } else {
        run_spectra(spectra, target_index, decoy_index, config, &params, cancellation, run_id)?
    };

    log::info!(
        "search complete: {} spectra, {} scored, {} PSMs, {} skipped",
        outcome.summary.total_spectra,
        outcome.summary.scored_spectra,
        outcome.psms.len(),
        outcome.summary.skipped.values().sum::<usize>()
    );

    Ok(outcome)
}

/// Run the target-decoy FDR procedure (spec.md C10) over every PSM `search` produced, filling in
/// each [`Psm::q_value`]. A global reduction, deliberately separate from [`search`] itself (spec.md
/// §5: "FDR computation ... is a global reduction that happens after the input stream is
/// exhausted"; §5 Cancellation: "Partial results are still valid PSMs but FDR will not be
/// computed" if the caller chooses not to call this after a cancelled run).
#[must_use]
pub fn assign_q_values(psms: Vec<Psm>, decoy_factor: f64) -> Vec<Psm> {
    let scored: Vec<ScoredPsm> = psms
        .iter()
        .map(|p| ScoredPsm {
            score: p.xcorr,
            is_decoy: p.is_decoy,
        })
        .collect();
    let annotated = compute_fdr(scored, decoy_factor);

    // `compute_fdr` stably sorts by score descending; re-sorting the PSMs themselves the same
    // way lines each PSM back up with its annotation one-to-one (spec.md §9: "scorer collapses
    // to a pure function", reused here rather than duplicating the sort/walk).
    let mut sorted = psms;
    sorted.sort_by(|a, b| b.xcorr.partial_cmp(&a.xcorr).expect("xcorr scores are always finite"));

    sorted
        .into_iter()
        .zip(annotated)
        .map(|(mut psm, annotated)| {
            psm.q_value = Some(annotated.q_value);
            psm
        })
        .collect()
}

/// Retain only the PSMs whose assigned q-value is at or below `threshold` (spec.md §4.10 step 4,
/// default `0.01` per spec.md §6 `fdr_threshold`). PSMs with no q-value yet (i.e. before
/// [`assign_q_values`] ran) are dropped, since they have not passed FDR control.
#[must_use]
pub fn filter_psms_by_qvalue(psms: Vec<Psm>, threshold: f64) -> Vec<Psm> {
    psms.into_iter()
        .filter(|p| p.q_value.is_some_and(|q| q <= threshold))
        .collect()
}
