use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::types::{ProfileId, UserId};

/// next-of-kin contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOfKin {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

/// KYC details captured from a borrower before their first application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub title: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub national_id: String,
    pub occupation: Option<String>,
    pub employer_name: Option<String>,
    pub employer_address: Option<String>,
    pub designation: Option<String>,
    pub residential_address: String,
    pub terms_accepted: bool,
    pub next_of_kin: NextOfKin,
}

impl NewProfile {
    /// check required fields and terms acceptance
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("title", &self.title),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("national_id", &self.national_id),
            ("residential_address", &self.residential_address),
            ("next_of_kin.name", &self.next_of_kin.name),
            ("next_of_kin.phone", &self.next_of_kin.phone),
            ("next_of_kin.relationship", &self.next_of_kin.relationship),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
        }

        if !self.terms_accepted {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(())
    }

    /// blank optional fields are stored as absent
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.middle_name,
            &mut self.occupation,
            &mut self.employer_name,
            &mut self.employer_address,
            &mut self.designation,
        ] {
            if field.as_deref().map_or(false, |v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }
}

/// a borrower profile, one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: NewProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// validate and stamp a new profile for `user_id`
    pub fn create(
        user_id: UserId,
        details: NewProfile,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        details.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            details: details.normalized(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn full_name(&self) -> String {
        let d = &self.details;
        match d.middle_name.as_deref() {
            Some(middle) => format!("{} {} {}", d.first_name, middle, d.last_name),
            None => format!("{} {}", d.first_name, d.last_name),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> NewProfile {
    NewProfile {
        title: "Ms".to_string(),
        first_name: "Amina".to_string(),
        middle_name: Some(String::new()),
        last_name: "Otieno".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        national_id: "28765432".to_string(),
        occupation: Some("Nurse".to_string()),
        employer_name: None,
        employer_address: None,
        designation: Some("  ".to_string()),
        residential_address: "Kilimani, Nairobi".to_string(),
        terms_accepted: true,
        next_of_kin: NextOfKin {
            name: "Joseph Otieno".to_string(),
            phone: "+254700000000".to_string(),
            relationship: "Brother".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_profile_is_normalized() {
        let profile = Profile::create(Uuid::new_v4(), sample_profile(), Utc::now()).unwrap();

        assert_eq!(profile.details.middle_name, None);
        assert_eq!(profile.details.designation, None);
        assert_eq!(profile.details.occupation.as_deref(), Some("Nurse"));
        assert_eq!(profile.full_name(), "Amina Otieno");
    }

    #[test]
    fn test_terms_must_be_accepted() {
        let mut details = sample_profile();
        details.terms_accepted = false;

        assert_eq!(details.validate(), Err(ValidationError::TermsNotAccepted));
    }

    #[test]
    fn test_blank_required_field_rejected() {
        let mut details = sample_profile();
        details.national_id = "   ".to_string();
        assert_eq!(
            details.validate(),
            Err(ValidationError::MissingField { field: "national_id" })
        );

        let mut details = sample_profile();
        details.next_of_kin.phone.clear();
        assert_eq!(
            details.validate(),
            Err(ValidationError::MissingField { field: "next_of_kin.phone" })
        );
    }

    #[test]
    fn test_optional_employment_fields() {
        let mut details = sample_profile();
        details.occupation = None;
        details.employer_name = Some("Nairobi Academy".to_string());

        let profile = Profile::create(Uuid::new_v4(), details, Utc::now()).unwrap();
        assert_eq!(profile.details.occupation, None);
        assert_eq!(profile.details.employer_name.as_deref(), Some("Nairobi Academy"));
    }
}
