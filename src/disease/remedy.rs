//! Treatment recommendations and the infected-class policy
//!
//! The remedy table is generic fungal-disease care advice; it is not keyed
//! by disease, so a recommendation is drawn at random once a class is
//! considered infected.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::labels::Labels;

/// Treatment recommendation with its Marathi translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Remedy {
    pub text: String,
    pub translation: String,
}

/// (English, Marathi) remedy pairs
pub const REMEDIES: [(&str, &str); 9] = [
    (
        "Enhance air circulation by spacing plants adequately and pruning dense foliage. This practice minimizes lingering moisture on leaves, ensuring rapid drying and reducing the favorable conditions for fungal pathogens.",
        "वनस्पतींमध्ये योग्य अंतर राखून आणि घनपड्या पानांची छाटणी करून हवेचा प्रवाह सुधारावा. या पद्धतीने पानांवरील ओलावा कमी होतो, ज्यामुळे फफूंदीजन्य रोगांच्या अनुकूल वातावरणात लवकर कोरडे होतात.",
    ),
    (
        "Apply a broad-spectrum fungicide, preferably copper or sulfur-based, at the first sign of infection. Follow label recommendations, and reapply after heavy rains to consistently suppress fungal growth.",
        "पहिल्या लक्षणा दिसताच कॉपर किंवा सल्फर-आधारित व्यापक स्पेक्ट्रम फंगिसाइड लावा. लेबलवरील सूचना पाळा आणि पावसामुळे ओलावा वाढल्यास पुन्हा लावा जेणेकरून फंगसचा वाढ रोखता येईल.",
    ),
    (
        "Implement a strategic crop rotation plan by avoiding the planting of similar crops in the same location each season. This disrupts the buildup of soil pathogens and minimizes recurring disease outbreaks.",
        "दर वर्षी सारखे पीक एका ठिकाणी न लावता पीकांची फेरबदल योजनेची अंमलबजावणी करा. या पद्धतीने मातीतील रोगाणूंचा संचय थांबतो आणि रोग पुनरावृत्ती कमी होते.",
    ),
    (
        "Regularly inspect your plants for early signs of disease and promptly remove any infected leaves, stems, or fruits. Dispose of the affected material properly to prevent the spread of spores to healthy parts.",
        "पिकांवरील रोगाच्या लक्षणांची नियमित तपासणी करा आणि संक्रमित पानं, डाळिंब किंवा फळं लगेच काढून टाका. संक्रमित साहित्य योग्यरित्या नष्ट करा जेणेकरून रोगाणू निरोगी भागांमध्ये पसरू नयेत.",
    ),
    (
        "Adopt targeted watering practices by using drip irrigation or soaker hoses to deliver water directly to the soil. This method keeps the foliage dry, thereby deterring the moisture-dependent spread of fungal infections.",
        "ड्रिप इरिगेशन किंवा सोकर होसेस वापरून पाण्याची योग्य पद्धतीने मातीमध्ये थेट पूरवठा करा. या पद्धतीने पानं कोरडी राहतात, ज्यामुळे फंगसचा ओलावावर अवलंबून प्रसार थांबतो.",
    ),
    (
        "Focus on building healthy soil by incorporating organic compost and ensuring excellent drainage. A well-nourished and well-drained soil environment boosts the plant’s natural defenses against infections.",
        "जैविक कंपोस्ट मिसळून आणि उत्तम ड्रेनेज सुनिश्चित करून मातीची गुणवत्ता सुधारावी. चांगल्या पोषणयुक्त आणि व्यवस्थित निचरा असलेल्या मातीमुळे पिकांची नैसर्गिक रोगप्रतिकारक क्षमता वाढते.",
    ),
    (
        "When available, choose plant varieties known for their resistance to fungal pathogens. Resistant cultivars can substantially reduce the impact of diseases, making overall plant care more effective.",
        "उपलब्ध असल्यास, फफूंदीजन्य रोगांपासून प्रतिकारक्षम असे पीक प्रकार निवडा. रोगप्रतिकारक किस्मांमुळे रोगांचा परिणाम कमी होतो आणि एकूणच पिकांची काळजी घेणे सोपे जाते.",
    ),
    (
        "Use a layer of organic mulch around the base of your plants to curb soil splashing during rain. Mulching helps maintain a stable moisture level in the soil and minimizes the transfer of soil-borne pathogens to foliage.",
        "पिकांच्या तळाशी जैविक मल्च लावा ज्यामुळे पावसामुळे मातीचा उड्या पडण्याचा त्रास कमी होईल. मल्चिंगमुळे मातीतील ओलावा स्थिर राहतो आणि मातीतील रोगाणूंचा प्रसार पानांपर्यंत मर्यादित राहतो.",
    ),
    (
        "Sanitize all gardening tools regularly by cleaning and disinfecting them between uses. This routine is essential to stop the inadvertent spread of pathogens from one plant to another during routine care.",
        "सर्व बागकामाच्या उपकरणांची नियमितपणे स्वच्छता आणि निर्जंतुकीकरण करा. या प्रक्रियेने एका वनस्पतीवरून दुसऱ्या वनस्पतीपर्यंत रोगाणूंचा अनपेक्षित प्रसार थांबतो.",
    ),
];

// ============================================================================
// RemedyPolicy
// ============================================================================

/// Decides which predicted classes receive a treatment recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct RemedyPolicy {
    infected: BTreeSet<usize>,
}

impl RemedyPolicy {
    /// Every label not mentioning "healthy" is treated as infected
    pub fn from_labels(labels: &Labels) -> Self {
        let infected = labels
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.to_lowercase().contains("healthy"))
            .map(|(i, _)| i)
            .collect();

        Self { infected }
    }

    /// Explicit infected indices (e.g. `AGRI_INFECTED_INDICES=0,3,5,6`)
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        Self {
            infected: indices.into_iter().collect(),
        }
    }

    pub fn is_infected(&self, index: usize) -> bool {
        self.infected.contains(&index)
    }

    pub fn infected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.infected.iter().copied()
    }

    /// Remedy for the arg-max class, drawn uniformly from [`REMEDIES`]
    pub fn remedy_for<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Option<Remedy> {
        if !self.is_infected(index) {
            return None;
        }

        REMEDIES.choose(rng).map(|(text, translation)| Remedy {
            text: (*text).to_string(),
            translation: (*translation).to_string(),
        })
    }
}
