use crate::media::MediaKind;
use crate::model::CandidateFile;
use std::collections::HashMap;
use std::path::Path;

/// A still image and its motion clip. Always scheduled together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePhotoPair {
    pub image: CandidateFile,
    pub video: CandidateFile,
}

/// The atomic scheduling item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingUnit {
    Pair(LivePhotoPair),
    Single(CandidateFile),
}

impl GroupingUnit {
    /// Member files, image first for pairs.
    pub fn into_files(self) -> Vec<CandidateFile> {
        match self {
            GroupingUnit::Pair(pair) => vec![pair.image, pair.video],
            GroupingUnit::Single(file) => vec![file],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    pub pairs: Vec<LivePhotoPair>,
    pub singles: Vec<CandidateFile>,
}

impl Grouping {
    pub fn unit_count(&self) -> usize {
        self.pairs.len() + self.singles.len()
    }

    /// Pairs first, then singles.
    pub fn into_units(self) -> impl Iterator<Item = GroupingUnit> {
        self.pairs
            .into_iter()
            .map(GroupingUnit::Pair)
            .chain(self.singles.into_iter().map(GroupingUnit::Single))
    }
}

#[derive(Debug)]
struct Member {
    file: CandidateFile,
    kind: Option<MediaKind>,
}

/// Bucket candidates by lower-cased file stem and split each bucket into
/// Live Photo pairs and singles. Buckets keep first-seen order.
///
/// A bucket becomes a pair only when it holds exactly one image and one
/// video. Same-class collisions and buckets of three or more fall back to
/// singles.
pub fn group_live_photos(files: Vec<CandidateFile>) -> Grouping {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Vec<Member>> = Vec::new();

    for file in files {
        let path = Path::new(&file.relative_path);
        let key = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let kind = MediaKind::of_path(path);

        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(Member { file, kind });
    }

    let mut grouping = Grouping::default();
    for bucket in buckets {
        classify(bucket, &mut grouping);
    }
    grouping
}

fn classify(bucket: Vec<Member>, grouping: &mut Grouping) {
    let mut members = bucket.into_iter();
    match (members.next(), members.next(), members.next()) {
        (Some(a), Some(b), None) => match (a.kind, b.kind) {
            (Some(MediaKind::Image), Some(MediaKind::Video)) => {
                grouping.pairs.push(LivePhotoPair {
                    image: a.file,
                    video: b.file,
                });
            }
            (Some(MediaKind::Video), Some(MediaKind::Image)) => {
                grouping.pairs.push(LivePhotoPair {
                    image: b.file,
                    video: a.file,
                });
            }
            _ => grouping.singles.extend([a.file, b.file]),
        },
        (first, second, third) => grouping.singles.extend(
            first
                .into_iter()
                .chain(second)
                .chain(third)
                .chain(members)
                .map(|member| member.file),
        ),
    }
}
