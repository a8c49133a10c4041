//! Phase job generation.
//!
//! Each phase assigns the player a task built from a template keyed by the
//! target object's material tags. Sampling excludes structural doors and
//! the last two picks so back-to-back phases never repeat an object.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocab::MaterialTag;
use crate::world::{ObjectId, WorldObject};

/// A phase task. Ephemeral; replaced every phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job id.
    pub id: Uuid,
    /// Short title, shown as the speech headline.
    pub title: String,
    /// What Jacobs actually wants done.
    pub description: String,
    /// Display names of objects the review will look at.
    pub object_hints: Vec<String>,
}

impl Job {
    /// One-line form for prompts: `title — description`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} — {}", self.title, self.description)
    }
}

struct JobTemplate {
    tag: Option<MaterialTag>,
    title: &'static str,
    description: &'static str,
}

// First template whose tag matches wins; the tagless entry is the fallback.
const TEMPLATES: &[JobTemplate] = &[
    JobTemplate {
        tag: Some(MaterialTag::Flammable),
        title: "Fire-safety sweep",
        description: "Check the {object} and make sure nothing near it can catch fire.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Electronic),
        title: "IT asset audit",
        description: "The {object} goes on the asset register. Inspect it and log its condition.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Liquid),
        title: "Spill containment",
        description: "Deal with the {object} before facilities files another complaint.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Fragile),
        title: "Careful handling",
        description: "Move the {object} somewhere sensible. Break it and it comes out of your pay.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Paper),
        title: "Filing backlog",
        description: "Sort out the {object}. Compliance wants it done yesterday.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Heavy),
        title: "Heavy lifting",
        description: "The {object} is in the wrong place. Fix that.",
    },
    JobTemplate {
        tag: Some(MaterialTag::Edible),
        title: "Break room duty",
        description: "Sort out the {object}. The break room is a disgrace.",
    },
    JobTemplate {
        tag: None,
        title: "General upkeep",
        description: "Give the {object} a once-over and report anything unusual.",
    },
];

fn template_for(object: &WorldObject) -> &'static JobTemplate {
    TEMPLATES
        .iter()
        .find(|t| match t.tag {
            Some(tag) => object.tags.contains(&tag),
            None => true,
        })
        .unwrap_or(&TEMPLATES[TEMPLATES.len() - 1])
}

/// Job sampler with repeat suppression.
#[derive(Debug, Default)]
pub struct JobGenerator {
    recent: VecDeque<ObjectId>,
}

impl JobGenerator {
    /// Create a generator with no pick history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the next job from `catalog`.
    ///
    /// Doors are excluded by the catalog itself; this additionally excludes
    /// the last two picked objects unless nothing else remains. Returns
    /// `None` only for an empty catalog.
    pub fn next_job<R: Rng + ?Sized>(
        &mut self,
        catalog: &[WorldObject],
        rng: &mut R,
    ) -> Option<Job> {
        if catalog.is_empty() {
            return None;
        }

        let mut pool: Vec<&WorldObject> = catalog
            .iter()
            .filter(|o| !self.recent.contains(&o.id))
            .collect();
        if pool.is_empty() {
            pool = catalog.iter().collect();
        }

        let picked = pool[rng.gen_range(0..pool.len())].clone();

        self.recent.push_back(picked.id);
        while self.recent.len() > 2 {
            self.recent.pop_front();
        }

        let template = template_for(&picked);
        Some(Job {
            id: Uuid::new_v4(),
            title: template.title.to_string(),
            description: template.description.replace("{object}", &picked.name),
            object_hints: vec![picked.name],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog(names: &[(&str, MaterialTag)]) -> Vec<WorldObject> {
        names
            .iter()
            .map(|(name, tag)| WorldObject::new(*name, vec![*tag]))
            .collect()
    }

    #[test]
    fn templates_follow_tags() {
        let objects = catalog(&[("Space Heater", MaterialTag::Flammable)]);
        let mut rng = StdRng::seed_from_u64(7);
        let job = JobGenerator::new().next_job(&objects, &mut rng).expect("job");

        assert_eq!(job.title, "Fire-safety sweep");
        assert!(job.description.contains("Space Heater"));
        assert_eq!(job.object_hints, vec!["Space Heater".to_string()]);
    }

    #[test]
    fn untagged_matches_fall_back_to_generic() {
        let objects = vec![WorldObject::new("Mystery Box", vec![MaterialTag::Magnetic])];
        let mut rng = StdRng::seed_from_u64(7);
        let job = JobGenerator::new().next_job(&objects, &mut rng).expect("job");
        assert_eq!(job.title, "General upkeep");
    }

    #[test]
    fn recent_picks_are_excluded() {
        let objects = catalog(&[
            ("A", MaterialTag::Paper),
            ("B", MaterialTag::Paper),
            ("C", MaterialTag::Paper),
        ]);
        let mut generator = JobGenerator::new();
        let mut rng = StdRng::seed_from_u64(42);

        let first = generator.next_job(&objects, &mut rng).expect("job");
        let second = generator.next_job(&objects, &mut rng).expect("job");
        let third = generator.next_job(&objects, &mut rng).expect("job");

        assert_ne!(first.object_hints, second.object_hints);
        assert_ne!(second.object_hints, third.object_hints);
        assert_ne!(first.object_hints, third.object_hints);
    }

    #[test]
    fn exhausted_pool_reuses_recent_picks() {
        let objects = catalog(&[("Only", MaterialTag::Paper)]);
        let mut generator = JobGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);

        // With a one-object catalog the exclusion list must not deadlock.
        for _ in 0..3 {
            let job = generator.next_job(&objects, &mut rng).expect("job");
            assert_eq!(job.object_hints, vec!["Only".to_string()]);
        }
    }

    #[test]
    fn empty_catalog_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(JobGenerator::new().next_job(&[], &mut rng).is_none());
    }
}
