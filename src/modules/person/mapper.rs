use time::OffsetDateTime;

use super::models::{Person, PersonDtoV2};

/// Hand-written conversions for the v2 representation.
///
/// The birth date is not persisted: entity to DTO stamps the current time,
/// DTO to entity drops whatever the client sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonMapper;

impl PersonMapper {
    pub fn entity_to_dto(&self, person: &Person) -> PersonDtoV2 {
        self.entity_to_dto_at(person, OffsetDateTime::now_utc())
    }

    pub fn entity_to_dto_at(&self, person: &Person, birth_day: OffsetDateTime) -> PersonDtoV2 {
        PersonDtoV2 {
            id: person.id.unwrap_or_default(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            birth_day: Some(birth_day),
            address: person.address.clone(),
            gender: person.gender.clone(),
        }
    }

    pub fn dto_to_entity(&self, dto: PersonDtoV2) -> Person {
        Person {
            id: (dto.id > 0).then_some(dto.id),
            first_name: dto.first_name,
            last_name: dto.last_name,
            address: dto.address,
            gender: dto.gender,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn dto_v2() -> PersonDtoV2 {
        PersonDtoV2 {
            id: 0,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            birth_day: Some(datetime!(1990-05-01 00:00 UTC)),
            address: "Rua A".into(),
            gender: "F".into(),
        }
    }

    #[test]
    fn birth_day_is_dropped_on_the_way_in() {
        let entity = PersonMapper.dto_to_entity(dto_v2());
        assert_eq!(entity.first_name, "Ana");
        assert_eq!(entity.id, None);
        assert!(entity.enabled);
    }

    #[test]
    fn birth_day_is_stamped_on_the_way_out() {
        let mut entity = PersonMapper.dto_to_entity(dto_v2());
        entity.id = Some(4);

        let before = OffsetDateTime::now_utc();
        let dto = PersonMapper.entity_to_dto(&entity);

        assert_eq!(dto.id, 4);
        assert!(dto.birth_day.unwrap() >= before);
        assert_ne!(dto.birth_day, dto_v2().birth_day);
    }
}
