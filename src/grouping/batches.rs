use super::pairs::Grouping;
use crate::model::CandidateFile;

/// Files handed to one invocation of the transformation step. A pair
/// contributes two files but one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub files: Vec<CandidateFile>,
    pub units: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn relative_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.relative_path.clone()).collect()
    }
}

/// Pack pairs, then singles, into batches of at most `batch_size` units.
/// A zero size is treated as one.
pub fn schedule_batches(grouping: Grouping, batch_size: usize) -> Vec<Batch> {
    let capacity = batch_size.max(1);
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for unit in grouping.into_units() {
        if current.units >= capacity {
            batches.push(std::mem::take(&mut current));
        }
        current.files.extend(unit.into_files());
        current.units += 1;
    }

    if current.units > 0 {
        batches.push(current);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::pairs::{group_live_photos, LivePhotoPair};

    fn candidate(rel: &str) -> CandidateFile {
        CandidateFile::new(rel, format!("/src/{}", rel))
    }

    fn singles(n: usize) -> Grouping {
        Grouping {
            pairs: Vec::new(),
            singles: (0..n).map(|i| candidate(&format!("IMG_{:04}.jpg", i))).collect(),
        }
    }

    #[test]
    fn test_250_singles_make_three_batches() {
        let batches = schedule_batches(singles(250), 100);
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let batches = schedule_batches(singles(200), 100);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.units == 100));
    }

    #[test]
    fn test_empty_grouping_yields_no_batches() {
        assert!(schedule_batches(Grouping::default(), 100).is_empty());
    }

    #[test]
    fn test_pairs_count_as_one_unit_and_are_never_split() {
        let pairs: Vec<LivePhotoPair> = (0..5)
            .map(|i| LivePhotoPair {
                image: candidate(&format!("live_{}.heic", i)),
                video: candidate(&format!("live_{}.mov", i)),
            })
            .collect();
        let grouping = Grouping {
            pairs: pairs.clone(),
            singles: vec![candidate("a.jpg"), candidate("b.jpg")],
        };

        let batches = schedule_batches(grouping, 2);
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[2].files.len(), 3);
        assert_eq!(batches[3].files.len(), 1);

        for pair in &pairs {
            let holder = batches
                .iter()
                .position(|b| b.files.contains(&pair.image))
                .unwrap();
            assert!(batches[holder].files.contains(&pair.video));
        }
    }

    #[test]
    fn test_batch_count_is_ceiling_of_units() {
        let mut files = Vec::new();
        for i in 0..37 {
            files.push(candidate(&format!("p{}.jpg", i)));
            files.push(candidate(&format!("p{}.mov", i)));
        }
        for i in 0..64 {
            files.push(candidate(&format!("s{}.png", i)));
        }
        let grouping = group_live_photos(files);
        let units = grouping.unit_count();
        assert_eq!(units, 101);

        let batches = schedule_batches(grouping, 10);
        assert_eq!(batches.len(), (units + 9) / 10);
        let (last, full) = batches.split_last().unwrap();
        assert!(full.iter().all(|b| b.units == 10));
        assert_eq!(last.units, 1);
        assert_eq!(batches.iter().map(|b| b.units).sum::<usize>(), units);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let batches = schedule_batches(singles(3), 0);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn test_relative_paths() {
        let batches = schedule_batches(singles(2), 100);
        assert_eq!(
            batches[0].relative_paths(),
            vec!["IMG_0000.jpg".to_string(), "IMG_0001.jpg".to_string()]
        );
    }
}
