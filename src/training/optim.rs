//! Limited-memory BFGS minimizer for smooth objectives

use ndarray::Array1;
use std::collections::VecDeque;

/// Outcome of a minimization run
#[derive(Debug, Clone)]
pub struct LbfgsResult {
    /// Final parameters
    pub x: Array1<f64>,
    /// Objective value at `x`
    pub fun: f64,
    /// Iterations performed
    pub n_iter: usize,
    /// Whether a stopping tolerance was met before the iteration bound
    pub converged: bool,
}

/// L-BFGS with Armijo backtracking line search
#[derive(Debug, Clone)]
pub struct Lbfgs {
    max_iter: usize,
    /// Gradient tolerance on the max-norm
    gtol: f64,
    /// Relative tolerance on the objective decrease
    ftol: f64,
}

impl Default for Lbfgs {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Lbfgs {
    const C1: f64 = 1e-4;
    const MAX_BACKTRACK: usize = 40;
    /// Correction pairs kept for the two-loop recursion
    const HISTORY: usize = 10;

    pub fn new(max_iter: usize) -> Self {
        Self {
            max_iter,
            gtol: 1e-4,
            ftol: 1e3 * f64::EPSILON,
        }
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Minimize `f`, which returns the objective and its gradient
    pub fn minimize<F>(&self, mut f: F, x0: Array1<f64>) -> LbfgsResult
    where
        F: FnMut(&Array1<f64>) -> (f64, Array1<f64>),
    {
        let mut x = x0;
        let (mut fx, mut g) = f(&x);

        if max_abs(&g) <= self.gtol {
            return LbfgsResult {
                x,
                fun: fx,
                n_iter: 0,
                converged: true,
            };
        }

        let mut s_hist: VecDeque<Array1<f64>> = VecDeque::with_capacity(Self::HISTORY);
        let mut y_hist: VecDeque<Array1<f64>> = VecDeque::with_capacity(Self::HISTORY);
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 1..=self.max_iter {
            n_iter = iter;

            let mut d = Self::direction(&g, &s_hist, &y_hist);
            let mut slope = g.dot(&d);
            if slope >= 0.0 {
                s_hist.clear();
                y_hist.clear();
                d = g.mapv(|v| -v);
                slope = g.dot(&d);
            }

            // first step has no curvature estimate yet
            let mut t = if s_hist.is_empty() {
                (1.0 / g.dot(&g).sqrt()).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..Self::MAX_BACKTRACK {
                let candidate = &x + &(t * &d);
                let (f_new, g_new) = f(&candidate);
                if f_new.is_finite() && f_new <= fx + Self::C1 * t * slope {
                    accepted = Some((candidate, f_new, g_new));
                    break;
                }
                t *= 0.5;
            }

            let Some((x_new, f_new, g_new)) = accepted else {
                break;
            };

            let s = &x_new - &x;
            let y = &g_new - &g;
            if s.dot(&y) > 1e-10 {
                if s_hist.len() == Self::HISTORY {
                    s_hist.pop_front();
                    y_hist.pop_front();
                }
                s_hist.push_back(s);
                y_hist.push_back(y);
            }

            let decrease = fx - f_new;
            let scale = fx.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            fx = f_new;
            g = g_new;

            if max_abs(&g) <= self.gtol || decrease <= self.ftol * scale {
                converged = true;
                break;
            }
        }

        LbfgsResult {
            x,
            fun: fx,
            n_iter,
            converged,
        }
    }

    /// Two-loop recursion for the quasi-Newton direction
    fn direction(
        g: &Array1<f64>,
        s_hist: &VecDeque<Array1<f64>>,
        y_hist: &VecDeque<Array1<f64>>,
    ) -> Array1<f64> {
        let k = s_hist.len();
        let mut q = g.clone();
        let mut alphas = vec![0.0; k];
        let rhos: Vec<f64> = s_hist
            .iter()
            .zip(y_hist.iter())
            .map(|(s, y)| 1.0 / s.dot(y))
            .collect();

        for i in (0..k).rev() {
            alphas[i] = rhos[i] * s_hist[i].dot(&q);
            q.scaled_add(-alphas[i], &y_hist[i]);
        }

        let gamma = match (s_hist.back(), y_hist.back()) {
            (Some(s), Some(y)) => s.dot(y) / y.dot(y),
            _ => 1.0,
        };
        let mut r = q * gamma;

        for i in 0..k {
            let beta = rhos[i] * y_hist[i].dot(&r);
            r.scaled_add(alphas[i] - beta, &s_hist[i]);
        }

        r.mapv_into(|v| -v)
    }
}

fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0f64, |m, x| m.max(x.abs()))
}
