//! Placeholder images for extracted medication lines.
//!
//! The images are decorative. Which one a line gets carries no meaning, so
//! the choice is behind the `ImagePicker` seam and tests can pin it.

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};

use medcompanion_contracts::model::MedicationEntry;
use medcompanion_core::traits::ImagePicker;

/// Photo ids in the placeholder pool.
pub const PLACEHOLDER_IDS: [&str; 5] = [
    "1584308666744-24d5c474f2ae",
    "1559757148-5c350d0d3c56",
    "1550572017-edd951aa8ca0",
    "1587854692-8356e88ac3bb",
    "1576670159805-fdcab9543ce0",
];

pub fn placeholder_url(photo_id: &str) -> String {
    format!("https://images.unsplash.com/photo-{photo_id}?w=100&h=100&fit=crop")
}

/// Uniformly random choice from the pool. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomImagePicker;

impl ImagePicker for RandomImagePicker {
    fn pick(&self, _entry: &MedicationEntry) -> String {
        let id = PLACEHOLDER_IDS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PLACEHOLDER_IDS[0]);
        placeholder_url(id)
    }
}

/// Picks by hashing the medication name, so the same drug always shows the
/// same image.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestImagePicker;

impl ImagePicker for DigestImagePicker {
    fn pick(&self, entry: &MedicationEntry) -> String {
        let digest = Sha256::digest(entry.name.trim().to_lowercase().as_bytes());
        let index = digest[0] as usize % PLACEHOLDER_IDS.len();
        placeholder_url(PLACEHOLDER_IDS[index])
    }
}

/// Always returns one URL.
#[derive(Debug, Clone)]
pub struct FixedImagePicker(pub String);

impl ImagePicker for FixedImagePicker {
    fn pick(&self, _entry: &MedicationEntry) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use medcompanion_contracts::model::{Confidence, MedicationEntry};
    use medcompanion_core::traits::ImagePicker;

    use super::*;

    fn entry(name: &str) -> MedicationEntry {
        MedicationEntry {
            id: 1,
            name: name.to_string(),
            dosage: "10mg".to_string(),
            frequency: "daily".to_string(),
            duration: "30 days".to_string(),
            instructions: "N/A".to_string(),
            confidence: Confidence::High,
            image: None,
        }
    }

    fn pool() -> Vec<String> {
        PLACEHOLDER_IDS.iter().map(|id| placeholder_url(id)).collect()
    }

    #[test]
    fn random_picker_stays_in_pool() {
        let pool = pool();
        for _ in 0..50 {
            assert!(pool.contains(&RandomImagePicker.pick(&entry("Lisinopril"))));
        }
    }

    #[test]
    fn digest_picker_is_stable_and_case_insensitive() {
        let a = DigestImagePicker.pick(&entry("Metformin"));
        let b = DigestImagePicker.pick(&entry("  metformin "));
        assert_eq!(a, b);
        assert!(pool().contains(&a));
    }

    #[test]
    fn fixed_picker_returns_its_url() {
        let picker = FixedImagePicker("https://img.test/a.png".to_string());
        assert_eq!(picker.pick(&entry("x")), "https://img.test/a.png");
    }
}
