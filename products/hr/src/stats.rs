//! Dashboard counters and the statistics page.

use std::collections::{BTreeMap, HashMap};

use entity::projet::Etat;
use platform_db::{affectations, departements, employees, projets};
use sea_orm::{DatabaseConnection, Iterable};
use serde::Serialize;

use crate::{HrModule, HrResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Count {
    pub label: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Statistics {
    pub total_employees: u64,
    pub total_projets: u64,
    pub total_departements: u64,
    pub employees_per_departement: Vec<Count>,
    pub employees_per_grade: Vec<Count>,
    pub projets_per_etat: Vec<Count>,
    pub active_affectations_per_projet: Vec<Count>,
}

fn counts(map: BTreeMap<String, u64>) -> Vec<Count> {
    map.into_iter()
        .map(|(label, count)| Count { label, count })
        .collect()
}

impl HrModule {
    pub async fn employee_count(&self, db: &DatabaseConnection) -> HrResult<u64> {
        Ok(employees::count(db).await?)
    }

    pub async fn statistics(&self, db: &DatabaseConnection) -> HrResult<Statistics> {
        let staff = employees::list(db).await?;
        let depts = departements::list(db).await?;
        let projects = projets::list(db).await?;

        let labels: HashMap<i32, &str> = depts.iter().map(|d| (d.id, d.intitule.as_str())).collect();
        let mut per_dept = BTreeMap::new();
        let mut per_grade = BTreeMap::new();
        for e in &staff {
            if let Some(label) = e.id_departement.and_then(|id| labels.get(&id)) {
                *per_dept.entry(label.to_string()).or_insert(0) += 1;
            }
            let grade = e.grade.trim();
            if !grade.is_empty() {
                *per_grade.entry(grade.to_string()).or_insert(0) += 1;
            }
        }

        let projets_per_etat = Etat::iter()
            .filter_map(|etat| {
                let count = projects.iter().filter(|p| p.etat_projet == etat).count() as u64;
                (count > 0).then(|| Count {
                    label: etat.as_str().to_string(),
                    count,
                })
            })
            .collect();

        let mut active_per_projet: HashMap<i32, u64> = HashMap::new();
        for a in affectations::active(db).await? {
            *active_per_projet.entry(a.id_projet).or_insert(0) += 1;
        }
        let active_affectations_per_projet = projects
            .iter()
            .map(|p| Count {
                label: p.nom_projet.clone(),
                count: active_per_projet.get(&p.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(Statistics {
            total_employees: staff.len() as u64,
            total_projets: projects.len() as u64,
            total_departements: depts.len() as u64,
            employees_per_departement: counts(per_dept),
            employees_per_grade: counts(per_grade),
            projets_per_etat,
            active_affectations_per_projet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, departement, employee, memory_db, projet};
    use entity::affectation_projet;
    use platform_authz::Role;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn aggregates_every_section() {
        let db = memory_db().await;
        let rh = departement(&db, "RH", None).await;
        let it = departement(&db, "Informatique", None).await;
        let a = employee(&db, "a@cy-rh.local", Role::Employe, Some(it.id)).await;
        employee(&db, "b@cy-rh.local", Role::Employe, Some(it.id)).await;
        employee(&db, "c@cy-rh.local", Role::Employe, Some(rh.id)).await;
        employee(&db, "d@cy-rh.local", Role::Employe, None).await;
        let alpha = projet(&db, "Alpha", None).await;
        let beta = projet(&db, "Beta", None).await;
        for (id_projet, fin) in [(alpha.id, None), (alpha.id, None), (beta.id, Some(date(2024, 2, 1)))] {
            affectation_projet::ActiveModel {
                id_employer: Set(a.id),
                id_projet: Set(id_projet),
                date_affectation: Set(date(2024, 1, 20)),
                date_fin_affectation: Set(fin),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let stats = HrModule::default().statistics(&db).await.unwrap();
        assert_eq!(stats.total_employees, 4);
        assert_eq!(stats.total_projets, 2);
        assert_eq!(stats.total_departements, 2);
        assert_eq!(
            stats.employees_per_departement,
            vec![
                Count { label: "Informatique".into(), count: 2 },
                Count { label: "RH".into(), count: 1 },
            ]
        );
        assert_eq!(stats.employees_per_grade, vec![Count { label: "Senior".into(), count: 4 }]);
        assert_eq!(stats.projets_per_etat, vec![Count { label: "EN_COURS".into(), count: 2 }]);
        assert_eq!(
            stats.active_affectations_per_projet,
            vec![
                Count { label: "Alpha".into(), count: 2 },
                Count { label: "Beta".into(), count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn projets_without_assignments_count_zero() {
        let db = memory_db().await;
        projet(&db, "Solo", None).await;

        let stats = HrModule::default().statistics(&db).await.unwrap();
        assert_eq!(stats.active_affectations_per_projet.len(), 1);
        assert_eq!(
            stats.active_affectations_per_projet[0],
            Count { label: "Solo".into(), count: 0 }
        );
    }
}
