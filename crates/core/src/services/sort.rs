use super::{misrouted, BoxFuture, Service};
use crate::protocol::{Algo, EndpointKind, Request, Response, SortResponse};
use rand::Rng;

/// Sorts integer lists with a caller-chosen algorithm
#[derive(Debug, Default)]
pub struct SortService;

impl SortService {
    pub fn new() -> Self {
        Self
    }

    pub fn sort(&self, data: Vec<i64>, algo: Option<Algo>) -> SortResponse {
        let Some(algo) = algo else {
            return SortResponse {
                is_success: false,
                error: "No sorting algorithm specified".to_string(),
                ..Default::default()
            };
        };

        let data = match algo {
            Algo::Merge => merge_sort(data),
            Algo::Quick => {
                let mut data = data;
                quick_sort(&mut data, &mut rand::thread_rng());
                data
            }
            Algo::Intern => {
                let mut data = data;
                data.sort();
                data
            }
        };

        SortResponse {
            is_success: true,
            data,
            ..Default::default()
        }
    }
}

impl Service for SortService {
    fn name(&self) -> &'static str {
        "services.Sort"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[EndpointKind::SortSort]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::Sort(req) => Response::Sorted(self.sort(req.data, req.algo)),
                other => misrouted(self.name(), &other),
            }
        })
    }
}

fn merge_sort(data: Vec<i64>) -> Vec<i64> {
    if data.len() <= 1 {
        return data;
    }

    let mut left = data;
    let right = left.split_off(left.len() / 2);
    let (left, right) = (merge_sort(left), merge_sort(right));

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Three-way partitioning quicksort with a random pivot.
///
/// Recurses into the smaller side only and loops on the larger one, so the
/// stack depth stays logarithmic whatever the input order.
fn quick_sort<R: Rng>(mut data: &mut [i64], rng: &mut R) {
    while data.len() > 1 {
        let pivot = data[rng.gen_range(0..data.len())];
        let (mut lt, mut i, mut gt) = (0, 0, data.len());
        while i < gt {
            if data[i] < pivot {
                data.swap(lt, i);
                lt += 1;
                i += 1;
            } else if data[i] > pivot {
                gt -= 1;
                data.swap(i, gt);
            } else {
                i += 1;
            }
        }

        let (lower, rest) = std::mem::take(&mut data).split_at_mut(lt);
        let upper = &mut rest[gt - lt..];
        if lower.len() < upper.len() {
            quick_sort(lower, rng);
            data = upper;
        } else {
            quick_sort(upper, rng);
            data = lower;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn test_all_algorithms_agree() {
        let input = vec![5, -3, 9, 0, 5, 5, 1, -3, 42, 7];
        let mut expected = input.clone();
        expected.sort();

        let service = SortService::new();
        for algo in [Algo::Merge, Algo::Quick, Algo::Intern] {
            let reply = service.sort(input.clone(), Some(algo));
            assert!(reply.is_success);
            assert_eq!(reply.data, expected, "{algo:?}");
        }
    }

    #[test]
    fn test_empty_list_succeeds() {
        let reply = SortService::new().sort(Vec::new(), Some(Algo::Quick));
        assert!(reply.is_success);
        assert!(reply.data.is_empty());
    }

    /// Values arranged so that a middle-element pivot is always the largest
    /// value left, the layout that sends a naive quicksort n levels deep.
    ///
    /// Partitioning around the maximum moves it to the end and keeps the
    /// other elements in order, so each level removes the middle position
    /// of what remains.
    fn middle_pivot_worst_case(n: usize) -> Vec<i64> {
        let mut left: VecDeque<usize> = (0..n / 2).collect();
        let mut right: VecDeque<usize> = (n / 2..n).collect();
        let mut values = vec![0i64; n];

        for len in (1..=n).rev() {
            let middle = len / 2;
            while left.len() > middle {
                if let Some(position) = left.pop_back() {
                    right.push_front(position);
                }
            }
            while left.len() < middle {
                if let Some(position) = right.pop_front() {
                    left.push_back(position);
                }
            }
            let pivot = right.pop_front().unwrap();
            values[pivot] = (len - 1) as i64;
        }
        values
    }

    #[test]
    fn test_quick_sort_depth_is_bounded() {
        let input = middle_pivot_worst_case(200_000);
        let mut expected = input.clone();
        expected.sort();

        // 2 MiB, the default size of a spawned thread
        let sorted = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || SortService::new().sort(input, Some(Algo::Quick)))
            .unwrap()
            .join()
            .unwrap();

        assert!(sorted.is_success);
        assert_eq!(sorted.data, expected);
    }

    #[test]
    fn test_quick_sort_sorted_and_reversed() {
        let ascending: Vec<i64> = (0..50_000).collect();
        let descending: Vec<i64> = ascending.iter().rev().copied().collect();
        let service = SortService::new();

        assert_eq!(service.sort(ascending.clone(), Some(Algo::Quick)).data, ascending);
        assert_eq!(service.sort(descending, Some(Algo::Quick)).data, ascending);
    }

    #[test]
    fn test_missing_algorithm() {
        let reply = SortService::new().sort(vec![2, 1], None);
        assert!(!reply.is_success);
        assert!(!reply.error.is_empty());
    }
}
