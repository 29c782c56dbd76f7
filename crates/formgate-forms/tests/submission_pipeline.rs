//! End-to-end payload scenarios: one realistic webhook body per category,
//! pushed through extract → classify → contact → detail formatting.

use formgate_core::{BusinessType, Category, PriorityLevel, ProgramTag, ServiceTag};
use formgate_forms::FormProcessor;
use serde_json::json;

fn education_payload() -> serde_json::Value {
    json!({
        "eventId": "ev_edu",
        "eventType": "form_response",
        "createdAt": "2026-03-01T09:30:00Z",
        "data": {
            "responseId": "resp_edu_001",
            "createdAt": "2026-03-01T09:30:00Z",
            "fields": [
                {"label": "Adınız Soyadınız", "value": "Ahmet Yılmaz Demir"},
                {"label": "Mail Adresiniz", "value": "ahmet@example.com"},
                {"label": "Telefon Numaranız", "value": "+90 555 123 4567"},
                {"label": "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Eğitim Danışmanlığı)", "value": true},
                {"label": "İlgilendiğiniz Eğitim Seviyesi (Yüksek Lisans (Master programları))", "value": true},
                {"label": "İlgilendiğiniz Eğitim Seviyesi (Dil Okulları (Yetişkinler için genel, IELTS veya mesleki İngilizce))", "value": "true"},
                {"label": "Not Ortalamanız", "value": "3.2"},
                {"label": "Eğitim ve Konaklama için Düşündüğünüz Bütçe Nedir? (£)", "value": "£25,000"}
            ]
        }
    })
}

fn legal_payload() -> serde_json::Value {
    json!({
        "data": {
            "responseId": "resp_legal_001",
            "createdAt": "2026-03-01T11:00:00Z",
            "fields": [
                {"label": "Full Name", "value": "Zeynep Arslan"},
                {"label": "Email Address", "value": "zeynep@example.com"},
                {"label": "Phone Number", "value": "+44 7700 900123"},
                {"label": "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Vize ve Hukuki Danışmanlık)", "value": true},
                {"label": "Hangi konularda hukuki destek almak istiyorsunuz? (Vize Reddi İtiraz ve Yeniden Başvuru Danışmanlığı)", "value": true},
                {"label": "Hangi konularda hukuki destek almak istiyorsunuz? (İngiltere Turistik Vize (Visitor Visa))", "value": true},
                {"label": "Hangi konularda hukuki destek almak istiyorsunuz?", "value": "Vizem reddedildi, itiraz etmek istiyorum"}
            ]
        }
    })
}

fn business_payload() -> serde_json::Value {
    json!({
        "data": {
            "responseId": "resp_biz_001",
            "createdAt": "2026-03-01T14:15:00Z",
            "fields": [
                {"label": "Adınız Soyadınız", "value": "Mehmet Kaya"},
                {"label": "Mail Adresiniz", "value": "mehmet@acmetekstil.com"},
                {"label": "Şirketinizin Adı", "value": "Acme Tekstil Ltd"},
                {"label": "Hangi Konuda Danışmanlık Almak İstiyorsunuz? (Ticari Danışmanlık)", "value": true},
                {"label": "Sektörünüz (Tekstil ve Giyim)", "value": true},
                {"label": "Sektörünüz (Ayakkabı ve Deri Ürünleri)", "value": true}
            ]
        }
    })
}

#[test]
fn education_submission_flows_to_high_priority_summary() {
    let processor = FormProcessor::new();
    let extracted = processor.extract_form_data(&education_payload());

    assert_eq!(extracted.submission_id, "resp_edu_001");
    assert!(extracted.category_flags.education);
    assert_eq!(
        extracted.education.selected_programs,
        vec![ProgramTag::Master, ProgramTag::LanguageSchool]
    );

    let category = processor.determine_category(&extracted);
    assert_eq!(category, Category::Education);

    let contact = processor.get_contact_info(&extracted);
    assert_eq!(contact.firstname, "Ahmet");
    assert_eq!(contact.lastname, "Yılmaz Demir");
    assert!(contact.valid);

    let details = processor.get_category_specific_data(&extracted, category);
    let education = details.as_education().expect("education summary");
    assert_eq!(
        education.programs_text,
        "Yüksek Lisans (Master), Dil Okulu"
    );
    assert_eq!(education.priority_level, PriorityLevel::High);
    assert_eq!(education.budget_formatted.as_deref(), Some("£25,000"));
}

#[test]
fn legal_submission_with_refusal_appeal_is_urgent() {
    let processor = FormProcessor::new();
    let extracted = processor.extract_form_data(&legal_payload());

    let category = processor.determine_category(&extracted);
    assert_eq!(category, Category::Legal);

    let details = processor.get_category_specific_data(&extracted, category);
    let legal = details.as_legal().expect("legal summary");
    assert_eq!(legal.urgency_level, PriorityLevel::Urgent);
    assert_eq!(
        legal.selected_services,
        vec![ServiceTag::TouristVisa, ServiceTag::VisaRefusalAppeal]
    );
    assert_eq!(legal.topic, "Vizem reddedildi, itiraz etmek istiyorum");
}

#[test]
fn business_submission_produces_consumer_goods_summary() {
    let processor = FormProcessor::new();
    let extracted = processor.extract_form_data(&business_payload());

    let category = processor.determine_category(&extracted);
    assert_eq!(category, Category::Business);

    let details = processor.get_category_specific_data(&extracted, category);
    let business = details.as_business().expect("business summary");
    assert_eq!(business.company_name, "Acme Tekstil Ltd");
    assert_eq!(business.business_type, BusinessType::ConsumerGoods);
    assert_eq!(business.sectors_text, "Tekstil ve Giyim, Ayakkabı ve Deri");
    assert!(business.requires_meeting);
}

#[test]
fn empty_fields_array_rejected_by_caller_contract() {
    let processor = FormProcessor::new();
    let extracted = processor.extract_form_data(&json!({
        "data": {"responseId": "resp_empty", "createdAt": "", "fields": []}
    }));

    assert_eq!(extracted.email, "");
    let contact = processor.get_contact_info(&extracted);
    assert!(!contact.valid);
    assert_eq!(processor.determine_category(&extracted), Category::General);
}
